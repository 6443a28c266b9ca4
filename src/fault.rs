//! Fault state management for RustEspNowRelay.
//!
//! A node that cannot reach its radio or its pins has no function left.
//! Fatal errors stop the active sequence and latch here, where the firmware
//! idle loop (and anything inspecting the node afterwards) can see why.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::error::NodeError;

/// Fault codes indicating why the node stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Radio/network bring-up failed at startup.
    TransportInit = 1,

    /// Peer table rejected the configured peer.
    PeerTable = 2,

    /// Send request rejected under a fatal send policy.
    SendRequest = 3,

    /// Hardware fault: GPIO or ADC error.
    HardwareFault = 4,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::TransportInit,
            2 => FaultCode::PeerTable,
            3 => FaultCode::SendRequest,
            4 => FaultCode::HardwareFault,
            _ => FaultCode::None,
        }
    }
}

/// Thread-safe fault state.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// if let Err(e) = node.run() {
///     FAULT.record(&e);
/// }
///
/// // In idle loop:
/// if FAULT.is_active() {
///     report(FAULT.snapshot());
/// }
/// ```
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Driver error code, 0 if none.
    data: AtomicI32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicI32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Set fault state.
    #[inline]
    pub fn set(&self, code: FaultCode, data: i32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Latch the fault for a fatal node error.
    #[inline]
    pub fn record(&self, error: &NodeError) {
        self.set(error.fault_code(), error.driver_code());
    }

    /// Check if fault is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Get driver error code.
    #[inline]
    pub fn data(&self) -> i32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear fault state. The counter is kept.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Get a snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: i32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::TransportError;

    #[test]
    fn test_fault_state_basic() {
        let fault = FaultState::new();

        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.count(), 0);

        fault.set(FaultCode::HardwareFault, 42);

        assert!(fault.is_active());
        assert_eq!(fault.code(), FaultCode::HardwareFault);
        assert_eq!(fault.data(), 42);
        assert_eq!(fault.count(), 1);

        fault.clear();

        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1); // Count preserved
    }

    #[test]
    fn test_record_node_error() {
        let fault = FaultState::new();
        fault.record(&NodeError::TransportInit(TransportError::Driver(0x101)));

        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::TransportInit);
        assert_eq!(snap.data, 0x101);
    }

    #[test]
    fn test_from_u8_unknown_is_none() {
        assert_eq!(FaultCode::from_u8(3), FaultCode::SendRequest);
        assert_eq!(FaultCode::from_u8(200), FaultCode::None);
    }
}
