//! Non-blocking logging for RustEspNowRelay.
//!
//! # Architecture
//!
//! ```text
//! radio callbacks        LogStream            app thread
//! app thread             ─────────            ──────────
//!
//! node_log!() ─────────▶ [L0][L1][L2] ──────▶ log facade
//! never blocks            lock-free           (EspLogger on target)
//! ```
//!
//! # Rules
//!
//! - Radio callbacks shall NEVER call blocking log functions
//! - Callbacks and components log through `node_log!()` and friends
//! - Log messages may be dropped if the ring is full (counted)

use core::sync::atomic::{AtomicU32, Ordering};

use crate::ring::Ring;

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Map to the `log` facade level.
    pub fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    /// Message text (lossy on invalid UTF-8).
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            // Truncation may split a multi-byte char: keep the valid prefix
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            level: LogLevel::Info,
            len: 0,
            msg: [0; MAX_MSG_LEN],
        }
    }
}

impl core::fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogEntry")
            .field("timestamp_us", &self.timestamp_us)
            .field("level", &self.level)
            .field("msg", &self.message())
            .finish()
    }
}

/// Lock-free log stream (MPSC: multiple producers, single consumer).
///
/// - Callbacks and the app thread can push concurrently
/// - Push never blocks (drops message if full)
/// - Drain runs on the app thread at leisure
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    ring: Ring<LogEntry, N>,
    dropped: AtomicU32,
}

impl<const N: usize> LogStream<N> {
    /// Create a new empty log stream.
    pub const fn new() -> Self {
        Self {
            ring: Ring::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry (never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    /// Messages longer than [`MAX_MSG_LEN`] are truncated.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut entry = LogEntry {
            timestamp_us,
            level,
            len: 0,
            msg: [0; MAX_MSG_LEN],
        };
        let len = msg.len().min(MAX_MSG_LEN);
        entry.msg[..len].copy_from_slice(&msg[..len]);
        entry.len = len as u8;

        if self.ring.push(entry).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Drain next log entry (app thread only).
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        self.ring.pop()
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        !self.ring.is_empty()
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        self.ring.len()
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written. Output past the buffer end is cut.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Monotonic timestamp for log entries.
#[cfg(target_os = "espidf")]
#[inline]
pub fn timestamp_us() -> i64 {
    // SAFETY: esp_timer_get_time is always safe to call
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}

/// Host builds have no system timer; entries are stamped 0.
#[cfg(not(target_os = "espidf"))]
#[inline]
pub fn timestamp_us() -> i64 {
    0
}

/// Non-blocking log macro.
///
/// # Example
///
/// ```ignore
/// node_log!(LogLevel::Info, session.log(), "sent {} to {}", command, peer);
/// ```
#[macro_export]
macro_rules! node_log {
    ($level:expr, $stream:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($crate::logging::timestamp_us(), $level, &buf[..len]);
    }};
}

/// Non-blocking info log.
#[macro_export]
macro_rules! node_info {
    ($stream:expr, $($arg:tt)*) => {
        $crate::node_log!($crate::logging::LogLevel::Info, $stream, $($arg)*)
    };
}

/// Non-blocking warning log.
#[macro_export]
macro_rules! node_warn {
    ($stream:expr, $($arg:tt)*) => {
        $crate::node_log!($crate::logging::LogLevel::Warn, $stream, $($arg)*)
    };
}

/// Non-blocking error log.
#[macro_export]
macro_rules! node_error {
    ($stream:expr, $($arg:tt)*) => {
        $crate::node_log!($crate::logging::LogLevel::Error, $stream, $($arg)*)
    };
}

/// Non-blocking debug log.
#[macro_export]
macro_rules! node_debug {
    ($stream:expr, $($arg:tt)*) => {
        $crate::node_log!($crate::logging::LogLevel::Debug, $stream, $($arg)*)
    };
}
