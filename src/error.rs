//! Node error taxonomy.

use core::fmt;

use crate::fault::FaultCode;
use crate::hal::{IoError, TransportError};

/// Errors surfaced by the radio session and the node sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// Radio/network bring-up failed. Fatal at startup.
    TransportInit(TransportError),
    /// Peer registration rejected. Fatal at startup.
    PeerTable(TransportError),
    /// Send request rejected synchronously. Fatal or logged per role policy.
    SendRequest(TransportError),
    /// GPIO/ADC access failed. Always fatal.
    Hardware(IoError),
}

impl NodeError {
    /// Fault code latched when this error stops the node.
    pub const fn fault_code(&self) -> FaultCode {
        match self {
            Self::TransportInit(_) => FaultCode::TransportInit,
            Self::PeerTable(_) => FaultCode::PeerTable,
            Self::SendRequest(_) => FaultCode::SendRequest,
            Self::Hardware(_) => FaultCode::HardwareFault,
        }
    }

    /// Driver error code, 0 if none.
    pub const fn driver_code(&self) -> i32 {
        match self {
            Self::TransportInit(e) | Self::PeerTable(e) | Self::SendRequest(e) => e.code(),
            Self::Hardware(IoError::Driver(code)) => *code,
            Self::Hardware(_) => 0,
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportInit(e) => write!(f, "transport init failed: {}", e),
            Self::PeerTable(e) => write!(f, "peer registration failed: {}", e),
            Self::SendRequest(e) => write!(f, "send request rejected: {}", e),
            Self::Hardware(e) => write!(f, "hardware I/O failed: {}", e),
        }
    }
}

impl From<IoError> for NodeError {
    fn from(e: IoError) -> Self {
        NodeError::Hardware(e)
    }
}
