//! Observability collaborators.
//!
//! The engine reports two kinds of messages: a smoothed frame-rate status and
//! shader diagnostics. Where they end up is the host's choice.

mod sink;

pub use sink::{LogSink, MemorySink, StatusSink};
