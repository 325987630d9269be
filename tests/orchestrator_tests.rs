//! Integration tests for complete simulation runs
//!
//! These tests run the orchestrator end to end with fast arrival processes and
//! verify the statistics and the recorded event stream.

mod common;

use bus_stop_simulator::*;
use common::*;
use std::fs;
use std::time::Duration;

fn fast_config() -> SimulationConfig {
    SimulationConfig {
        capacity: 5,
        rider_arrival_mean_ms: 10.0,
        bus_arrival_mean_ms: 80.0,
        time_scale: 1.0,
        boarding_time_ms: 0,
        duration_secs: Some(1),
        shutdown_grace_ms: 500,
        seed: Some(7),
        event_output: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_run_records_consistent_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let config = SimulationConfig {
        event_output: Some(path.display().to_string()),
        ..fast_config()
    };

    let orchestrator = SimulationOrchestrator::new(config).unwrap();
    let stats = tokio::time::timeout(TEST_TIMEOUT, orchestrator.run())
        .await
        .expect("run did not finish")
        .unwrap();

    assert!(stats.riders_arrived > 0, "no riders arrived: {:?}", stats);
    assert!(stats.buses_arrived > 0, "no buses arrived: {:?}", stats);
    assert!(stats.riders_boarded <= stats.riders_registered);
    assert!(stats.riders_registered <= stats.riders_arrived);
    assert!(stats.batch_riders_total <= stats.riders_boarded);
    assert!(stats.largest_batch <= 5);
    assert!(stats.buses_departed() <= stats.buses_arrived);
    assert_eq!(stats.riders_interrupted, 0);
    assert!(stats.simulation_duration >= Duration::from_secs(1));

    let content = fs::read_to_string(&path).unwrap();
    let events: Vec<StopEventKind> = content
        .lines()
        .map(|line| serde_json::from_str::<StopEvent>(line).unwrap().kind)
        .collect();
    assert!(!events.is_empty());

    let departed_riders: usize = events
        .iter()
        .filter_map(|event| match event {
            StopEventKind::BusDeparted { departure, .. } => Some(departure.riders()),
            _ => None,
        })
        .sum();
    assert_eq!(departed_riders, stats.batch_riders_total);
    assert_batches_exact(&events);
}

#[tokio::test]
async fn test_shutdown_before_run_spawns_nothing() {
    let orchestrator = SimulationOrchestrator::new(SimulationConfig {
        shutdown_grace_ms: 0,
        ..fast_config()
    })
    .unwrap();
    orchestrator.shutdown();

    let stats = orchestrator.run().await.unwrap();
    // Generators check the token before their first spawn
    assert_eq!(stats.riders_arrived, 0);
    assert_eq!(stats.buses_arrived, 0);
    assert_eq!(orchestrator.in_flight_participants(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manual_participants_share_the_stop() {
    let orchestrator = SimulationOrchestrator::new(SimulationConfig {
        capacity: 3,
        ..fast_config()
    })
    .unwrap();
    let controller = orchestrator.controller().clone();

    for index in 1..=2 {
        orchestrator.spawn_rider(RiderId::new(index));
    }
    wait_until("riders registered", || controller.waiting() == 2).await;
    assert_eq!(orchestrator.in_flight_participants(), 2);

    orchestrator.spawn_bus(BusId::new(1));
    wait_until("participants finished", || orchestrator.in_flight_participants() == 0).await;
    assert_eq!(controller.waiting(), 0);
    assert_eq!(controller.admitted(), 0);
    assert_eq!(controller.peak_boarders(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_external_cancellation_ends_run() {
    let orchestrator = SimulationOrchestrator::new(SimulationConfig {
        duration_secs: None,
        shutdown_grace_ms: 100,
        ..fast_config()
    })
    .unwrap();

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });

    let stats = tokio::time::timeout(TEST_TIMEOUT, orchestrator.run())
        .await
        .expect("run ignored cancellation")
        .unwrap();
    assert!(stats.simulation_duration >= Duration::from_millis(200));
}
