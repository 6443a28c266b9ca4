//! Radio transport capability (connectionless peer-to-peer link).
//!
//! Mirrors the ESP-NOW driver surface: init, peer table, send request, and
//! two callbacks invoked from the driver's own task context.

use core::fmt;

use crate::peer::{Channel, PeerAddress};

/// Result of one accepted send, reported asynchronously by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Success,
    Failure,
}

/// Network interface a peer is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interface {
    Station,
    AccessPoint,
}

/// Transport-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Operation needs a successful `init` first
    NotInitialized,
    /// `init` already ran on this transport
    AlreadyInitialized,
    /// Peer table has no free entry
    PeerTableFull,
    /// Peer entry rejected (bad address, channel or interface)
    InvalidPeer,
    /// Peer already in the table
    PeerExists,
    /// Destination not in the peer table
    PeerNotFound,
    /// Payload larger than one frame
    PayloadTooLarge,
    /// Driver ran out of memory
    OutOfMemory,
    /// Any other driver error code
    Driver(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => f.write_str("transport not initialized"),
            Self::AlreadyInitialized => f.write_str("transport already initialized"),
            Self::PeerTableFull => f.write_str("peer table full"),
            Self::InvalidPeer => f.write_str("invalid peer entry"),
            Self::PeerExists => f.write_str("peer already registered"),
            Self::PeerNotFound => f.write_str("peer not registered"),
            Self::PayloadTooLarge => f.write_str("payload too large"),
            Self::OutOfMemory => f.write_str("out of memory"),
            Self::Driver(code) => write!(f, "driver error {}", code),
        }
    }
}

impl TransportError {
    /// Raw driver code for fault diagnostics (0 when not a driver error).
    pub const fn code(&self) -> i32 {
        match self {
            Self::Driver(code) => *code,
            _ => 0,
        }
    }
}

/// Connectionless radio link.
///
/// Callbacks run in a transport-owned context, concurrently with the caller
/// and with each other. They must not block.
pub trait RadioTransport {
    /// Bring up the radio in station mode on `channel`, optionally overriding
    /// the station MAC. Callable once.
    fn init(
        &mut self,
        channel: Channel,
        station_address: Option<PeerAddress>,
    ) -> Result<(), TransportError>;

    /// Install the send-result callback (peer, outcome).
    fn register_send_callback<F>(&mut self, callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, SendOutcome) + Send + 'static;

    /// Install the receive callback (source, raw frame).
    fn register_receive_callback<F>(&mut self, callback: F) -> Result<(), TransportError>
    where
        F: FnMut(PeerAddress, &[u8]) + Send + 'static;

    /// Add one peer-table entry.
    fn add_peer(
        &mut self,
        address: PeerAddress,
        channel: Channel,
        interface: Interface,
    ) -> Result<(), TransportError>;

    /// Submit one frame. Returning `Ok` only means the request was accepted;
    /// the outcome arrives through the send callback.
    fn send(&mut self, address: PeerAddress, payload: &[u8]) -> Result<(), TransportError>;
}
