//! Stop events and their delivery
//!
//! Participants describe what happens at the stop with [`StopEvent`]s and publish
//! them through an [`EventSink`]. The orchestrator drains the sink into statistics
//! and, optionally, a JSON-lines file.

pub mod sink;
pub mod stop_event;

pub use sink::{EventReceiver, EventSink};
pub use stop_event::{StopEvent, StopEventKind};
