//! Log drain: forwards [`LogStream`] entries to the `log` facade.
//!
//! On target the facade is backed by `EspLogger`, so entries end up on the
//! IDF console. Runs on the app thread only.
//!
//! ```text
//! LogStream ──drain──▶ log::log!() ──▶ EspLogger ──▶ console
//! ```

use crate::logging::LogStream;

/// Interval between dropped-message reports (µs).
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Forward every pending entry to the `log` facade.
///
/// Returns the number of entries forwarded.
pub fn drain_to_log<const N: usize>(stream: &LogStream<N>) -> usize {
    let mut count = 0;
    while let Some(entry) = stream.drain() {
        log::log!(
            target: "relay",
            entry.level.to_log_level(),
            "[{:10}] {}",
            entry.timestamp_us,
            entry.message()
        );
        count += 1;
    }
    count
}

/// Periodic drain with rate-limited dropped-message reports.
pub struct LogDrain {
    last_report_us: i64,
}

impl LogDrain {
    pub const fn new() -> Self {
        Self { last_report_us: 0 }
    }

    /// Drain `stream` and, at most once per [`DROPPED_REPORT_INTERVAL_US`],
    /// report and reset its dropped counter.
    ///
    /// Returns `(forwarded, reported_dropped)`.
    pub fn poll<const N: usize>(&mut self, stream: &LogStream<N>, now_us: i64) -> (usize, u32) {
        let forwarded = drain_to_log(stream);

        if now_us - self.last_report_us < DROPPED_REPORT_INTERVAL_US {
            return (forwarded, 0);
        }
        self.last_report_us = now_us;

        let dropped = stream.dropped();
        if dropped > 0 {
            log::warn!(target: "relay", "Dropped log messages: {}", dropped);
            stream.reset_dropped();
        }
        (forwarded, dropped)
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new()
    }
}
