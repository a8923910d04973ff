//! Transport metrics types.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A serializable snapshot of a transport's traffic counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportMetrics {
    /// Total number of bytes sent.
    pub bytes_sent: u64,

    /// Total number of bytes received.
    pub bytes_received: u64,

    /// Total number of messages sent.
    pub messages_sent: u64,

    /// Total number of messages received.
    pub messages_received: u64,

    /// Inbound lines that could not be decoded.
    pub malformed_messages: u64,

    /// Responses that arrived for an id nobody was waiting on.
    pub orphaned_responses: u64,

    /// Requests currently awaiting a response.
    pub pending_requests: u64,

    /// The average request round trip, in milliseconds.
    pub average_latency_ms: f64,
}

/// Lock-free counters behind [`TransportMetrics`].
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    /// Total bytes sent (atomic counter).
    pub bytes_sent: AtomicU64,

    /// Total bytes received (atomic counter).
    pub bytes_received: AtomicU64,

    /// Total messages sent (atomic counter).
    pub messages_sent: AtomicU64,

    /// Total messages received (atomic counter).
    pub messages_received: AtomicU64,

    /// Undecodable inbound lines (atomic counter).
    pub malformed_messages: AtomicU64,

    /// Responses with no waiter (atomic counter).
    pub orphaned_responses: AtomicU64,

    /// Exponential moving average of round trips in microseconds.
    avg_latency_us: AtomicU64,
}

impl AtomicMetrics {
    /// Creates a new `AtomicMetrics` instance with all counters initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sent message of `size` bytes.
    pub fn record_sent(&self, size: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(size as u64, Ordering::Relaxed);
    }

    /// Records one received line of `size` bytes.
    pub fn record_received(&self, size: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(size as u64, Ordering::Relaxed);
    }

    /// Updates the average latency using an exponential moving average (EMA).
    pub fn update_latency_us(&self, latency_us: u64) {
        let current = self.avg_latency_us.load(Ordering::Relaxed);
        let new_avg = if current == 0 {
            latency_us
        } else {
            // alpha = 0.1, saturating so multi-second round trips cannot overflow
            current.saturating_mul(9).saturating_add(latency_us) / 10
        };
        self.avg_latency_us.store(new_avg, Ordering::Relaxed);
    }

    /// Creates a serializable snapshot from the current atomic values.
    ///
    /// `pending_requests` is left at zero for the transport to fill in from
    /// its own correlation table.
    pub fn snapshot(&self) -> TransportMetrics {
        let avg_latency_us = self.avg_latency_us.load(Ordering::Relaxed);
        TransportMetrics {
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            orphaned_responses: self.orphaned_responses.load(Ordering::Relaxed),
            pending_requests: 0,
            average_latency_ms: (avg_latency_us as f64) / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_metrics_default() {
        let snapshot = AtomicMetrics::new().snapshot();
        assert_eq!(snapshot, TransportMetrics::default());
    }

    #[test]
    fn test_record_traffic() {
        let metrics = AtomicMetrics::new();
        metrics.record_sent(100);
        metrics.record_sent(20);
        metrics.record_received(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.bytes_sent, 120);
        assert_eq!(snapshot.messages_sent, 2);
        assert_eq!(snapshot.bytes_received, 7);
        assert_eq!(snapshot.messages_received, 1);
    }

    #[test]
    fn test_ema_overflow_protection() {
        let metrics = AtomicMetrics::new();
        let large_latency = u64::MAX / 5;

        metrics.update_latency_us(large_latency);
        assert_eq!(
            metrics.snapshot().average_latency_ms,
            large_latency as f64 / 1000.0
        );

        for _ in 0..100 {
            metrics.update_latency_us(large_latency);
        }
        let snapshot = metrics.snapshot();
        assert!(snapshot.average_latency_ms > 0.0);
        assert!(snapshot.average_latency_ms.is_finite());
    }
}
