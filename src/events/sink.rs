//! Event delivery from participants to observers

use super::{StopEvent, StopEventKind};
use tokio::sync::mpsc;

/// Receiving half handed to whoever consumes stop events
pub type EventReceiver = mpsc::UnboundedReceiver<StopEvent>;

/// Where participants publish stop events
///
/// Publishing never blocks and never fails from the participant's point of view:
/// a sink without a receiver, or whose receiver has gone away, drops events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<StopEvent>>,
}

impl EventSink {
    /// A sink that discards everything
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// A connected sink and the receiver for its events
    pub fn channel() -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender: Some(sender) }, receiver)
    }

    /// Whether anyone is listening
    pub fn is_enabled(&self) -> bool {
        self.sender.as_ref().is_some_and(|sender| !sender.is_closed())
    }

    /// Record an event stamped with the current time
    pub fn emit(&self, kind: StopEventKind) {
        if let Some(sender) = &self.sender {
            // A closed receiver means nobody is observing any more
            let _ = sender.send(StopEvent::now(kind));
        }
    }
}
