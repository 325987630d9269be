//! Shared synchronization state of the bus stop
//!
//! [`RendezvousController`] owns every primitive riders and buses coordinate
//! through, and exposes the protocol steps as methods:
//!
//! | step                       | who   | primitive                          |
//! |----------------------------|-------|------------------------------------|
//! | [`enter`]                  | rider | admission gate (`capacity` permits) |
//! | [`register`]               | rider | stop lock, waiting count += 1       |
//! | [`await_boarding_call`]    | rider | boarding gate (0 permits)           |
//! | [`release_admission`]      | rider | admission gate                      |
//! | [`deregister_and_advance`] | rider | waiting count -= 1, then boarding gate or completion barrier |
//! | [`bus_arrive`]             | bus   | stop lock held across snapshot, boarding and completion barrier |
//!
//! The waiting count is incremented under the stop lock but decremented without
//! it. The decrement is safe because the boarding gate never carries more than
//! one permit: between a rider's return from [`await_boarding_call`] and its
//! [`deregister_and_advance`], no other rider of the batch can be running the
//! same steps. The active-boarder probe asserts this in debug builds.
//!
//! Every gate wait takes the waiting participant's own interrupt token. Cancelling
//! it fails that participant's wait with [`SimulationError::InterruptedWait`] and
//! touches nothing else: the signal it would have passed on is never sent, so the
//! rest of its batch (and its bus) stall.
//!
//! [`enter`]: RendezvousController::enter
//! [`register`]: RendezvousController::register
//! [`await_boarding_call`]: RendezvousController::await_boarding_call
//! [`release_admission`]: RendezvousController::release_admission
//! [`deregister_and_advance`]: RendezvousController::deregister_and_advance
//! [`bus_arrive`]: RendezvousController::bus_arrive

use crate::events::{EventSink, StopEventKind};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{BusId, Departure, Gate, RiderId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Take a permit from `gate`, unless `interrupt` fires first
async fn acquire_or_interrupt<'a>(
    gate: &'a Semaphore,
    interrupt: &CancellationToken,
) -> Option<SemaphorePermit<'a>> {
    tokio::select! {
        biased;
        _ = interrupt.cancelled() => None,
        permit = gate.acquire() => permit.ok(),
    }
}

/// What a boarded rider handed control to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Another rider of the batch got the boarding turn
    NextRider {
        /// Riders of the batch still to board
        remaining: usize,
    },
    /// This rider was the last one; the bus was signalled
    BatchComplete,
}

/// A rider's hold on one unit of stop capacity
///
/// Dropping the permit returns the capacity, so a rider that terminates early
/// does not leak it.
#[derive(Debug)]
#[must_use = "dropping the permit immediately gives the capacity back"]
pub struct AdmissionPermit<'a> {
    rider: RiderId,
    _permit: SemaphorePermit<'a>,
}

impl AdmissionPermit<'_> {
    /// The rider holding this permit
    pub fn rider(&self) -> RiderId {
        self.rider
    }
}

/// A bus's exclusive turn at the stop
///
/// Holding a `BusTurn` means holding the stop lock: no rider can register and no
/// other bus can take a snapshot until the turn is completed or dropped.
#[derive(Debug)]
#[must_use = "the stop stays locked until the turn is completed"]
pub struct BusTurn<'a> {
    controller: &'a RendezvousController,
    bus: BusId,
    waiting: usize,
    _guard: MutexGuard<'a, ()>,
}

impl BusTurn<'_> {
    /// The bus holding the turn
    pub fn bus(&self) -> BusId {
        self.bus
    }

    /// Size of the batch this bus committed to
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    /// Board the batch, or leave at once when it is empty, then release the stop
    ///
    /// An interrupted bus gives the stop up without its batch; riders of that
    /// batch still board, but nobody waits for them.
    pub async fn complete(self, interrupt: &CancellationToken) -> SimulationResult<Departure> {
        if self.waiting == 0 {
            debug!(bus = self.bus.index(), "No riders waiting, departing immediately");
            return Ok(Departure::Empty);
        }

        let controller = self.controller;
        debug!(bus = self.bus.index(), batch = self.waiting, "Opening boarding");
        controller.boarding.add_permits(1);

        acquire_or_interrupt(&controller.all_aboard, interrupt)
            .await
            .ok_or_else(|| SimulationError::interrupted(self.bus, Gate::CompletionBarrier))?
            .forget();

        debug_assert_eq!(
            controller.waiting(),
            0,
            "completion barrier released with riders still waiting"
        );
        Ok(Departure::BatchBoarded { riders: self.waiting })
    }
}

/// Owner of all shared state at the bus stop
#[derive(Debug)]
pub struct RendezvousController {
    capacity: usize,
    /// Riders currently registered as waiting
    waiting: AtomicUsize,
    admission: Semaphore,
    boarding: Semaphore,
    all_aboard: Semaphore,
    /// Guards waiting-count increments and a bus's whole turn
    stop_lock: Mutex<()>,
    active_boarders: AtomicUsize,
    peak_boarders: AtomicUsize,
    boarding_time: Duration,
    events: EventSink,
}

impl RendezvousController {
    /// Create a controller admitting at most `capacity` riders at once
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "stop capacity must be positive");
        Self {
            capacity,
            waiting: AtomicUsize::new(0),
            admission: Semaphore::new(capacity),
            boarding: Semaphore::new(0),
            all_aboard: Semaphore::new(0),
            stop_lock: Mutex::new(()),
            active_boarders: AtomicUsize::new(0),
            peak_boarders: AtomicUsize::new(0),
            boarding_time: Duration::ZERO,
            events: EventSink::disabled(),
        }
    }

    /// Set how long the physical boarding step takes
    pub fn with_boarding_time(mut self, boarding_time: Duration) -> Self {
        self.boarding_time = boarding_time;
        self
    }

    /// Publish stop events to `events`
    pub fn with_event_sink(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Maximum number of simultaneously admitted riders
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Riders currently registered as waiting
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Riders currently holding an admission permit
    pub fn admitted(&self) -> usize {
        self.capacity - self.admission.available_permits()
    }

    /// Boarding turns handed out but not yet taken by a rider
    pub fn pending_boarding_calls(&self) -> usize {
        self.boarding.available_permits()
    }

    /// Riders between their boarding call and their deregistration right now
    pub fn active_boarders(&self) -> usize {
        self.active_boarders.load(Ordering::Acquire)
    }

    /// Highest number of simultaneous active boarders ever observed
    pub fn peak_boarders(&self) -> usize {
        self.peak_boarders.load(Ordering::Acquire)
    }

    /// Duration of the physical boarding step
    pub fn boarding_time(&self) -> Duration {
        self.boarding_time
    }

    /// Where participants publish stop events
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Wait for a free unit of stop capacity
    pub async fn enter(
        &self,
        rider: RiderId,
        interrupt: &CancellationToken,
    ) -> SimulationResult<AdmissionPermit<'_>> {
        let permit = acquire_or_interrupt(&self.admission, interrupt)
            .await
            .ok_or_else(|| SimulationError::interrupted(rider, Gate::Admission))?;
        trace!(rider = rider.index(), admitted = self.admitted(), "Admission granted");
        Ok(AdmissionPermit { rider, _permit: permit })
    }

    /// Join the waiting count; returns the count including this rider
    ///
    /// Blocks while a bus holds the stop, which is what defers late riders to the
    /// next bus.
    ///
    /// The count stays within `capacity` until a registered rider is interrupted:
    /// its slot is never given back, so a later rider can push the count past it.
    pub async fn register(&self, rider: RiderId) -> usize {
        let _guard = self.stop_lock.lock().await;
        let waiting = self.waiting.fetch_add(1, Ordering::AcqRel) + 1;
        self.events.emit(StopEventKind::RiderRegistered { rider, waiting });
        waiting
    }

    /// Wait for this rider's boarding turn
    pub async fn await_boarding_call(
        &self,
        rider: RiderId,
        interrupt: &CancellationToken,
    ) -> SimulationResult<()> {
        acquire_or_interrupt(&self.boarding, interrupt)
            .await
            .ok_or_else(|| SimulationError::interrupted(rider, Gate::Boarding))?
            .forget();

        let active = self.active_boarders.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_boarders.fetch_max(active, Ordering::AcqRel);
        debug_assert_eq!(active, 1, "more than one rider holds a boarding turn");
        trace!(rider = rider.index(), "Boarding turn received");
        Ok(())
    }

    /// Give the rider's unit of capacity back
    ///
    /// Riders call this as soon as their boarding turn arrives, before the
    /// physical boarding step, so a new rider may be admitted while this one is
    /// still boarding.
    pub fn release_admission(&self, permit: AdmissionPermit<'_>) {
        trace!(rider = permit.rider.index(), "Admission released");
        drop(permit);
    }

    /// Leave the waiting count and pass the turn on
    ///
    /// Runs without the stop lock; see the module documentation.
    pub fn deregister_and_advance(&self, rider: RiderId) -> Advance {
        let previous = self.waiting.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "waiting count would go negative");
        let remaining = previous.saturating_sub(1);

        let active = self.active_boarders.fetch_sub(1, Ordering::AcqRel);
        debug_assert_eq!(active, 1, "deregistering rider did not hold the boarding turn");

        if remaining == 0 {
            self.events.emit(StopEventKind::AllAboard { rider });
            self.all_aboard.add_permits(1);
            Advance::BatchComplete
        } else {
            self.boarding.add_permits(1);
            Advance::NextRider { remaining }
        }
    }

    /// Take the stop lock and snapshot the waiting count
    ///
    /// Every rider whose [`register`](Self::register) completed before this
    /// returns belongs to the bus's batch; every later one does not.
    pub async fn acquire_stop(&self, bus: BusId) -> BusTurn<'_> {
        let guard = self.stop_lock.lock().await;
        let waiting = self.waiting();
        self.events.emit(StopEventKind::BusArrived { bus, waiting });
        BusTurn { controller: self, bus, waiting, _guard: guard }
    }

    /// A bus's whole protocol: snapshot, board the batch, release the stop
    pub async fn bus_arrive(
        &self,
        bus: BusId,
        interrupt: &CancellationToken,
    ) -> SimulationResult<Departure> {
        self.acquire_stop(bus).await.complete(interrupt).await
    }
}
