//! Lock-free bounded MPSC (Multiple Producer, Single Consumer) ring.
//!
//! Shared backbone of [`LogStream`](crate::logging::LogStream) and
//! [`EventQueue`](crate::event::EventQueue). Producers run in radio callback
//! context or on the application thread; the single consumer is always the
//! application thread.
//!
//! # Architecture
//!
//! ```text
//! send_cb ──┐
//! recv_cb ──┼──▶ [S0][S1][S2][S3] ──────▶ app loop
//! app     ──┘     lock-free            drain at leisure
//!                 never blocks
//! ```
//!
//! # Rules
//!
//! - Push never blocks: a full ring hands the value back to the caller
//! - Each slot carries a sequence stamp, so the consumer never observes a
//!   slot that a producer has claimed but not finished writing
//! - Only atomic operations for synchronization
//!
//! Stamps are stored relative to the slot index, which makes the all-zero
//! state a valid empty ring and lets the ring be built in a `const fn`.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, Ordering};

struct Slot<T> {
    /// Sequence stamp minus slot index.
    stamp: AtomicU32,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            stamp: AtomicU32::new(0),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Bounded lock-free ring buffer.
///
/// `N` must be a power of 2 (checked at compile time).
pub struct Ring<T: Copy, const N: usize> {
    slots: [Slot<T>; N],
    /// Next position a producer will claim.
    tail: AtomicU32,
    /// Next position the consumer will read.
    head: AtomicU32,
}

// SAFETY: Producers coordinate through compare-exchange on `tail` and publish
// through the slot stamp (Release). The single consumer observes the stamp
// (Acquire) before reading the value. T: Copy, so no drop bookkeeping.
unsafe impl<T: Copy + Send, const N: usize> Sync for Ring<T, N> {}
unsafe impl<T: Copy + Send, const N: usize> Send for Ring<T, N> {}

impl<T: Copy, const N: usize> Ring<T, N> {
    const MASK: u32 = (N as u32).wrapping_sub(1);

    /// Create an empty ring.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Ring size must be power of 2");
        assert!(N >= 2, "Ring size must be at least 2");
        assert!(N <= (1 << 16), "Ring size too large");

        Self {
            slots: [const { Slot::new() }; N],
            tail: AtomicU32::new(0),
            head: AtomicU32::new(0),
        }
    }

    #[inline]
    const fn lap_base(pos: u32) -> u32 {
        pos & !Self::MASK
    }

    /// Push a value (never blocks).
    ///
    /// Returns `Err(value)` if the ring is full.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[(pos & Self::MASK) as usize];
            let stamp = slot.stamp.load(Ordering::Acquire);
            let diff = stamp.wrapping_sub(Self::lap_base(pos)) as i32;

            if diff == 0 {
                // Slot is free for this lap: claim it
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: Position claimed exclusively by this producer
                        unsafe {
                            (*slot.value.get()).write(value);
                        }
                        slot.stamp
                            .store(Self::lap_base(pos).wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // Slot still holds the previous lap: ring full
                return Err(value);
            } else {
                // Another producer got here first
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop the oldest value (single consumer only).
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let pos = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[(pos & Self::MASK) as usize];
        let stamp = slot.stamp.load(Ordering::Acquire);

        if stamp != Self::lap_base(pos).wrapping_add(1) {
            return None;
        }

        // SAFETY: Stamp says the producer finished writing this lap's value
        let value = unsafe { (*slot.value.get()).assume_init() };

        slot.stamp
            .store(Self::lap_base(pos).wrapping_add(N as u32), Ordering::Release);
        self.head.store(pos.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Number of values waiting (approximate while producers are active).
    #[inline]
    pub fn len(&self) -> u32 {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    /// Check if nothing is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Copy, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
