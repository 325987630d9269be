//! Rider participant
//!
//! A rider is admitted, registers as waiting, waits for its boarding turn, gives
//! its capacity back, boards, and hands the turn to the next rider of the batch
//! (or tells the bus the batch is complete).

use super::controller::{Advance, RendezvousController};
use crate::events::StopEventKind;
use crate::simulation::SimulationResult;
use crate::stop_event;
use crate::types::{RiderId, RiderPhase};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

/// A single rider at the stop
#[derive(Debug, Clone)]
pub struct Rider {
    id: RiderId,
    phase: RiderPhase,
    /// Cuts short whichever gate wait the rider is in
    interrupt: CancellationToken,
}

impl Rider {
    /// Create a rider that has just arrived
    pub fn new(id: RiderId) -> Self {
        Self { id, phase: RiderPhase::Arrived, interrupt: CancellationToken::new() }
    }

    /// Use `interrupt` to cut this rider's waits short
    pub fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Token that interrupts this rider, and only this rider
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// This rider's identifier
    pub fn id(&self) -> RiderId {
        self.id
    }

    /// Where this rider is in its lifecycle
    pub fn phase(&self) -> RiderPhase {
        self.phase
    }

    fn advance(&mut self, to: RiderPhase) {
        debug_assert_eq!(self.phase.next(), Some(to), "illegal rider transition");
        trace!(rider = self.id.index(), from = %self.phase, to = %to, "Rider phase change");
        self.phase = to;
    }

    /// Run the whole rider protocol against `controller`
    ///
    /// Returns the terminal phase. An interrupted wait is logged and returned;
    /// the rider does not attempt any of its remaining steps. A rider interrupted
    /// after registering stays in the waiting count, so its bus never completes.
    #[instrument(name = "rider", skip_all, fields(rider = self.id.index()))]
    pub async fn run(mut self, controller: &RendezvousController) -> SimulationResult<RiderPhase> {
        match self.ride(controller).await {
            Ok(()) => Ok(self.phase),
            Err(error) => {
                if let Some(gate) = error.gate() {
                    controller.events().emit(StopEventKind::ParticipantInterrupted {
                        participant: self.id.into(),
                        gate,
                    });
                }
                error.log();
                Err(error)
            }
        }
    }

    async fn ride(&mut self, controller: &RendezvousController) -> SimulationResult<()> {
        let permit = controller.enter(self.id, &self.interrupt).await?;
        self.advance(RiderPhase::Admitted);
        controller.events().emit(StopEventKind::RiderArrived { rider: self.id });
        stop_event!(info, "Rider has arrived at the bus stop", rider = self.id.index());

        let waiting = controller.register(self.id).await;
        self.advance(RiderPhase::Registered);
        stop_event!(debug, "Rider is waiting", rider = self.id.index(), waiting = waiting);

        controller.await_boarding_call(self.id, &self.interrupt).await?;
        self.advance(RiderPhase::Released);

        controller.release_admission(permit);
        self.board(controller).await;

        match controller.deregister_and_advance(self.id) {
            Advance::NextRider { remaining } => {
                stop_event!(debug, "Boarding turn passed on", rider = self.id.index(), remaining = remaining);
            }
            Advance::BatchComplete => {
                stop_event!(
                    info,
                    "All riders have boarded. The bus is now preparing to depart",
                    rider = self.id.index()
                );
            }
        }
        self.advance(RiderPhase::Departed);
        Ok(())
    }

    async fn board(&mut self, controller: &RendezvousController) {
        let boarding_time = controller.boarding_time();
        if !boarding_time.is_zero() {
            tokio::time::sleep(boarding_time).await;
        }
        self.advance(RiderPhase::Boarded);
        controller.events().emit(StopEventKind::RiderBoarded { rider: self.id });
        stop_event!(info, "Rider boarded", rider = self.id.index());
    }
}
