//! Radio events handed from transport callbacks to the application thread.
//!
//! Callbacks never touch session or dispatch state. They push a
//! [`RadioEvent`] and return; the app loop drains the queue cooperatively.
//!
//! ```text
//! send_cb ─▶ SendResult ─┐
//!                        ├─▶ EventQueue ─▶ RadioSession::service()
//! recv_cb ─▶ Received  ──┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::SendOutcome;
use crate::peer::PeerAddress;
use crate::protocol::Payload;
use crate::ring::Ring;

/// Default queue depth.
pub const EVENT_QUEUE_SIZE: usize = 8;

/// One notification from the radio transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioEvent {
    /// Outcome of an accepted send.
    SendResult {
        peer: PeerAddress,
        outcome: SendOutcome,
    },
    /// Inbound frame.
    Received {
        source: PeerAddress,
        payload: Payload,
    },
}

/// Lock-free event queue (callbacks produce, app thread consumes).
pub struct EventQueue<const N: usize = EVENT_QUEUE_SIZE> {
    ring: Ring<RadioEvent, N>,
    dropped: AtomicU32,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            ring: Ring::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue from callback context. Returns `false` if the event was
    /// dropped because the queue is full.
    #[inline]
    pub fn push(&self, event: RadioEvent) -> bool {
        if self.ring.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Dequeue on the app thread.
    #[inline]
    pub fn pop(&self) -> Option<RadioEvent> {
        self.ring.pop()
    }

    /// Events lost to overflow since boot.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn pending(&self) -> u32 {
        self.ring.len()
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
