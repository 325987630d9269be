//! Helpers shared by the integration tests

#![allow(dead_code)]

use bus_stop_simulator::events::EventReceiver;
use bus_stop_simulator::{
    Bus, BusId, Departure, RendezvousController, Rider, RiderId, RiderPhase, SimulationResult,
    StopEventKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound for any single wait in a test
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll `condition` until it holds, failing the test after [`TEST_TIMEOUT`]
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let polled = tokio::time::timeout(TEST_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting until {}", what);
}

/// Start a rider's protocol on its own task
pub fn spawn_rider(
    controller: &Arc<RendezvousController>,
    index: u64,
) -> JoinHandle<SimulationResult<RiderPhase>> {
    let controller = controller.clone();
    tokio::spawn(async move { Rider::new(RiderId::new(index)).run(&controller).await })
}

/// Start a bus's protocol on its own task
pub fn spawn_bus(
    controller: &Arc<RendezvousController>,
    index: u64,
) -> JoinHandle<SimulationResult<Departure>> {
    let controller = controller.clone();
    tokio::spawn(async move { Bus::new(BusId::new(index)).run(&controller).await })
}

/// Start a rider whose waits can be interrupted through the returned token
pub fn spawn_interruptible_rider(
    controller: &Arc<RendezvousController>,
    index: u64,
) -> (JoinHandle<SimulationResult<RiderPhase>>, CancellationToken) {
    let rider = Rider::new(RiderId::new(index));
    let interrupt = rider.interrupt_token();
    let controller = controller.clone();
    (tokio::spawn(async move { rider.run(&controller).await }), interrupt)
}

/// Start a bus whose barrier wait can be interrupted through the returned token
pub fn spawn_interruptible_bus(
    controller: &Arc<RendezvousController>,
    index: u64,
) -> (JoinHandle<SimulationResult<Departure>>, CancellationToken) {
    let bus = Bus::new(BusId::new(index));
    let interrupt = bus.interrupt_token();
    let controller = controller.clone();
    (tokio::spawn(async move { bus.run(&controller).await }), interrupt)
}

/// Spawn riders `1..=count` and wait until all of them are registered
pub async fn register_riders(
    controller: &Arc<RendezvousController>,
    count: u64,
) -> Vec<JoinHandle<SimulationResult<RiderPhase>>> {
    let handles = (1..=count).map(|index| spawn_rider(controller, index)).collect();
    wait_until("riders registered", || controller.waiting() == count as usize).await;
    handles
}

/// Everything currently queued on the receiver
pub fn drain(receiver: &mut EventReceiver) -> Vec<StopEventKind> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event.kind);
    }
    events
}

/// Receive events until one matches `stop`, returning all of them
pub async fn collect_until(
    receiver: &mut EventReceiver,
    stop: impl Fn(&StopEventKind) -> bool,
) -> Vec<StopEventKind> {
    let mut events = Vec::new();
    let collected = tokio::time::timeout(TEST_TIMEOUT, async {
        while let Some(event) = receiver.recv().await {
            let done = stop(&event.kind);
            events.push(event.kind);
            if done {
                break;
            }
        }
    })
    .await;
    assert!(collected.is_ok(), "timed out collecting events: {:?}", events);
    events
}

/// Position of the first event matching `matches`
pub fn position(events: &[StopEventKind], matches: impl Fn(&StopEventKind) -> bool) -> usize {
    events
        .iter()
        .position(matches)
        .unwrap_or_else(|| panic!("event not found in {:?}", events))
}

/// Check batch exactness and bus serialization over an event sequence
///
/// - a bus's snapshot equals the riders registered since the previous batch closed
/// - no rider registers while a batch is open
/// - exactly the snapshot's number of riders board before the batch closes
/// - no bus takes the stop while another bus's batch is open
/// - each bus departs with the batch it snapshotted
pub fn assert_batches_exact(events: &[StopEventKind]) {
    let mut registered_since_last_batch = 0usize;
    let mut open_batch: Option<(BusId, usize, usize)> = None;
    let mut snapshots: HashMap<BusId, usize> = HashMap::new();

    for event in events {
        match event {
            StopEventKind::RiderRegistered { rider, .. } => {
                assert!(open_batch.is_none(), "{} registered during an open batch", rider);
                registered_since_last_batch += 1;
            }
            StopEventKind::BusArrived { bus, waiting } => {
                assert!(open_batch.is_none(), "{} took the stop during another batch", bus);
                assert_eq!(
                    *waiting, registered_since_last_batch,
                    "{} saw a snapshot that differs from the registered riders",
                    bus
                );
                snapshots.insert(*bus, *waiting);
                if *waiting > 0 {
                    open_batch = Some((*bus, *waiting, 0));
                }
            }
            StopEventKind::RiderBoarded { rider } => {
                let (bus, expected, boarded) =
                    open_batch.as_mut().unwrap_or_else(|| panic!("{} boarded with no bus", rider));
                *boarded += 1;
                assert!(*boarded <= *expected, "{} carried more riders than it snapshotted", bus);
            }
            StopEventKind::AllAboard { .. } => {
                let (bus, expected, boarded) =
                    open_batch.take().expect("batch closed without a bus");
                assert_eq!(boarded, expected, "{} released before its batch boarded", bus);
                registered_since_last_batch = 0;
            }
            StopEventKind::BusDeparted { bus, departure } => {
                assert_eq!(Some(&departure.riders()), snapshots.get(bus), "{} departure mismatch", bus);
            }
            StopEventKind::RiderArrived { .. } | StopEventKind::ParticipantInterrupted { .. } => {}
        }
    }
}
