//! Global instances shared by the radio callbacks and the app thread.
//!
//! Callbacks capture `&'static` references to these; the app thread is the
//! single consumer of both rings.

use crate::event::EventQueue;
use crate::fault::FaultState;
use crate::logging::LogStream;

/// Node log stream.
///
/// Multiple producers (app thread, send/receive callbacks), single consumer
/// (log drain on the app thread).
pub static NODE_LOG: LogStream = LogStream::new();

/// Radio events posted by transport callbacks.
pub static RADIO_EVENTS: EventQueue = EventQueue::new();

/// Latched fatal error, if any.
pub static FAULT: FaultState = FaultState::new();
