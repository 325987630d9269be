//! Main simulation orchestrator
//!
//! This module wires the arrival generators to the rendezvous controller and
//! controls the lifetime of a run.

use crate::arrivals::ArrivalGenerator;
use crate::events::{EventReceiver, EventSink, StopEvent};
use crate::rendezvous::{Bus, RendezvousController, Rider};
use crate::simulation::{SimulationError, SimulationResult, SimulationStatistics};
use crate::types::{BusId, RiderId, RunId, SimulationConfig};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn, Instrument};

/// Main simulation orchestrator that coordinates all components
#[derive(Debug)]
pub struct SimulationOrchestrator {
    /// Identifier of this run, attached to every log line of `run`
    run_id: RunId,
    /// Configuration for the simulation
    config: SimulationConfig,
    /// Shared synchronization state of the stop
    controller: Arc<RendezvousController>,
    /// Stops the arrival generators
    shutdown: CancellationToken,
    /// Every spawned rider and bus
    participants: TaskTracker,
    /// Receiver for stop events, taken by the first `run`
    events: Mutex<Option<EventReceiver>>,
    /// Statistics folded from the event stream
    statistics: Arc<Mutex<SimulationStatistics>>,
}

impl SimulationOrchestrator {
    /// Create a new simulation orchestrator
    #[instrument(skip(config), fields(capacity = config.capacity))]
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;

        let run_id = RunId::new();
        info!(
            %run_id,
            rider_mean_ms = config.rider_arrival_mean_ms,
            bus_mean_ms = config.bus_arrival_mean_ms,
            "Initializing simulation orchestrator"
        );

        let (sink, receiver) = EventSink::channel();
        let controller = RendezvousController::new(config.capacity)
            .with_boarding_time(config.boarding_time())
            .with_event_sink(sink);

        Ok(Self {
            run_id,
            config,
            controller: Arc::new(controller),
            shutdown: CancellationToken::new(),
            participants: TaskTracker::new(),
            events: Mutex::new(Some(receiver)),
            statistics: Arc::new(Mutex::new(SimulationStatistics::new())),
        })
    }

    /// Identifier of this run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Configuration of this run
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The shared stop state
    pub fn controller(&self) -> &Arc<RendezvousController> {
        &self.controller
    }

    /// Token that stops the arrival generators when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop creating participants; `run` returns once the grace period is over
    pub fn shutdown(&self) {
        info!(run_id = %self.run_id, "Shutdown requested");
        self.shutdown.cancel();
    }

    /// Riders and buses still executing their protocol
    pub fn in_flight_participants(&self) -> usize {
        self.participants.len()
    }

    /// Get a snapshot of the statistics gathered so far
    pub fn get_statistics(&self) -> SimulationStatistics {
        lock_statistics(&self.statistics).clone()
    }

    /// Start a rider's protocol in the background
    ///
    /// Cancelling the returned token interrupts this rider alone.
    pub fn spawn_rider(&self, id: RiderId) -> CancellationToken {
        spawn_rider(&self.participants, &self.controller, id)
    }

    /// Start a bus's protocol in the background
    ///
    /// Cancelling the returned token interrupts this bus alone.
    pub fn spawn_bus(&self, id: BusId) -> CancellationToken {
        spawn_bus(&self.participants, &self.controller, id)
    }

    /// Run both arrival generators until shut down
    ///
    /// Returns after the cancellation token fires (via [`shutdown`](Self::shutdown),
    /// the configured duration, or an external canceller) and the grace period
    /// for in-flight participants has passed. Participants still blocked at that
    /// point are left running.
    pub async fn run(&self) -> SimulationResult<SimulationStatistics> {
        let span = tracing::info_span!("simulation", run_id = %self.run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> SimulationResult<SimulationStatistics> {
        let receiver = self
            .events
            .lock()
            .map_err(|_| SimulationError::runtime_error("event receiver lock poisoned"))?
            .take()
            .ok_or_else(|| SimulationError::runtime_error("simulation has already been run"))?;

        let output = match &self.config.event_output {
            Some(path) => {
                info!(path = %path, "Writing stop events");
                Some(BufWriter::new(File::create(path).await?))
            }
            None => None,
        };

        let started = Instant::now();
        let pump_stop = CancellationToken::new();
        let pump = tokio::spawn(
            pump_events(receiver, output, self.statistics.clone(), pump_stop.clone())
                .in_current_span(),
        );

        let riders = {
            let tracker = self.participants.clone();
            let controller = self.controller.clone();
            tokio::spawn(
                ArrivalGenerator::riders(&self.config)
                    .run(self.shutdown.clone(), move |index| {
                        spawn_rider(&tracker, &controller, RiderId::new(index));
                    })
                    .in_current_span(),
            )
        };
        let buses = {
            let tracker = self.participants.clone();
            let controller = self.controller.clone();
            tokio::spawn(
                ArrivalGenerator::buses(&self.config)
                    .run(self.shutdown.clone(), move |index| {
                        spawn_bus(&tracker, &controller, BusId::new(index));
                    })
                    .in_current_span(),
            )
        };

        if let Some(duration) = self.config.run_duration() {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::time::sleep(duration) => {
                        info!(seconds = duration.as_secs(), "Configured run duration reached");
                        shutdown.cancel();
                    }
                }
            });
        }

        self.shutdown.cancelled().await;
        let riders_spawned = riders.await?;
        let buses_spawned = buses.await?;
        info!(riders_spawned, buses_spawned, "Arrivals stopped");

        self.participants.close();
        let grace = self.config.shutdown_grace();
        if tokio::time::timeout(grace, self.participants.wait()).await.is_err() {
            warn!(
                in_flight = self.participants.len(),
                waiting = self.controller.waiting(),
                "Participants still blocked at the stop after the grace period"
            );
        }

        pump_stop.cancel();
        pump.await??;

        let mut statistics = lock_statistics(&self.statistics);
        statistics.set_simulation_duration(started.elapsed());
        info!(
            riders_boarded = statistics.riders_boarded,
            buses_departed = statistics.buses_departed(),
            "Simulation finished"
        );
        Ok(statistics.clone())
    }
}

fn lock_statistics(statistics: &Mutex<SimulationStatistics>) -> MutexGuard<'_, SimulationStatistics> {
    // Counters stay meaningful even if a holder panicked mid-update
    statistics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spawn_rider(
    tracker: &TaskTracker,
    controller: &Arc<RendezvousController>,
    id: RiderId,
) -> CancellationToken {
    let rider = Rider::new(id);
    let interrupt = rider.interrupt_token();
    let controller = controller.clone();
    tracker.spawn(async move {
        if let Ok(phase) = rider.run(&controller).await {
            debug!(rider = id.index(), %phase, "Rider finished");
        }
    });
    interrupt
}

fn spawn_bus(
    tracker: &TaskTracker,
    controller: &Arc<RendezvousController>,
    id: BusId,
) -> CancellationToken {
    let bus = Bus::new(id);
    let interrupt = bus.interrupt_token();
    let controller = controller.clone();
    tracker.spawn(async move {
        if let Ok(departure) = bus.run(&controller).await {
            debug!(bus = id.index(), %departure, "Bus finished");
        }
    });
    interrupt
}

/// Fold stop events into statistics (and the output file) until `stop` fires
async fn pump_events(
    mut receiver: EventReceiver,
    mut output: Option<BufWriter<File>>,
    statistics: Arc<Mutex<SimulationStatistics>>,
    stop: CancellationToken,
) -> SimulationResult<()> {
    loop {
        tokio::select! {
            biased;
            event = receiver.recv() => match event {
                Some(event) => record_event(&event, &statistics, output.as_mut()).await?,
                None => break,
            },
            _ = stop.cancelled() => {
                while let Ok(event) = receiver.try_recv() {
                    record_event(&event, &statistics, output.as_mut()).await?;
                }
                break;
            }
        }
    }

    if let Some(mut writer) = output {
        writer.flush().await?;
    }
    Ok(())
}

async fn record_event(
    event: &StopEvent,
    statistics: &Mutex<SimulationStatistics>,
    output: Option<&mut BufWriter<File>>,
) -> SimulationResult<()> {
    lock_statistics(statistics).record(event);
    if let Some(writer) = output {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
    }
    Ok(())
}
