//! # RustEspNowRelay
//!
//! Battery-powered ESP-NOW command relay for access-control accessories.
//!
//! ## Architecture
//!
//! ```text
//! Trigger node                               Receiver node
//! ────────────                               ─────────────
//! InputPollLoop / PowerSequencer             RadioSession::service
//!        │                                          │
//!        ▼                                          ▼
//! RadioSession::send ──▶ "Open\0" ~~~radio~~~▶ receiver::dispatch ─▶ ActionHandler
//!        ▲                                          ▲
//! EventQueue ◀── transport callbacks ──▶ EventQueue
//! ```
//!
//! - Transport callbacks only enqueue [`RadioEvent`]s; the app thread drains
//! - All logging goes through the lock-free [`LogStream`]
//! - Role, pins and addressing are compiled in ([`CONFIG`])

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate alloc;

pub mod config;
pub mod error;
pub mod event;
pub mod fault;
pub mod hal;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod node;
pub mod peer;
pub mod poll;
pub mod protocol;
pub mod receiver;
pub mod ring;
pub mod sequencer;
pub mod session;

pub use config::{NodeConfig, NodeRole, SendErrorPolicy, CONFIG};
pub use error::NodeError;
pub use event::{EventQueue, RadioEvent};
pub use fault::{FaultCode, FaultState};
pub use log_globals::{FAULT, NODE_LOG, RADIO_EVENTS};
pub use logging::LogStream;
pub use node::{Node, NodeExit, StepOutcome};
pub use peer::{Channel, PeerAddress};
pub use poll::{InputPollLoop, TickOutcome, TriggerState};
pub use protocol::{decode, encode, Command, Payload};
pub use receiver::{ActionHandler, LoggingActionHandler};
pub use sequencer::{PowerSequencer, SequenceReport, SequencerState};
pub use session::{RadioSession, SessionRole};
