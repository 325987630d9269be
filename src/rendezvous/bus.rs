//! Bus participant

use super::controller::RendezvousController;
use crate::events::StopEventKind;
use crate::simulation::SimulationResult;
use crate::stop_event;
use crate::types::{BusId, BusPhase, Departure};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

/// A single bus at the stop
#[derive(Debug, Clone)]
pub struct Bus {
    id: BusId,
    phase: BusPhase,
    interrupt: CancellationToken,
}

impl Bus {
    /// Create a bus that has just arrived
    pub fn new(id: BusId) -> Self {
        Self { id, phase: BusPhase::Arrived, interrupt: CancellationToken::new() }
    }

    /// Use `interrupt` to cut this bus's wait for its batch short
    pub fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Token that interrupts this bus, and only this bus
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// This bus's identifier
    pub fn id(&self) -> BusId {
        self.id
    }

    /// Where this bus is in its lifecycle
    pub fn phase(&self) -> BusPhase {
        self.phase
    }

    fn advance(&mut self, to: BusPhase) {
        debug_assert!(self.phase.can_transition_to(to), "illegal bus transition");
        trace!(bus = self.id.index(), from = %self.phase, to = %to, "Bus phase change");
        self.phase = to;
    }

    /// Run the bus protocol: take the stop, board the batch (if any), depart
    #[instrument(name = "bus", skip_all, fields(bus = self.id.index()))]
    pub async fn run(mut self, controller: &RendezvousController) -> SimulationResult<Departure> {
        let turn = controller.acquire_stop(self.id).await;
        self.advance(BusPhase::DecisionPending);
        stop_event!(
            info,
            "Bus has arrived at the station",
            bus = self.id.index(),
            waiting = turn.waiting()
        );

        if turn.waiting() > 0 {
            self.advance(BusPhase::BoardingOpen);
        } else {
            self.advance(BusPhase::ImmediateDeparture);
            stop_event!(info, "Bus arrived. No riders, departing immediately", bus = self.id.index());
        }

        let departure = match turn.complete(&self.interrupt).await {
            Ok(departure) => departure,
            Err(error) => {
                if let Some(gate) = error.gate() {
                    controller.events().emit(StopEventKind::ParticipantInterrupted {
                        participant: self.id.into(),
                        gate,
                    });
                }
                error.log();
                return Err(error);
            }
        };

        self.advance(BusPhase::Departed);
        controller.events().emit(StopEventKind::BusDeparted { bus: self.id, departure });
        stop_event!(info, "Bus departed", bus = self.id.index(), riders = departure.riders());
        Ok(departure)
    }
}
