//! Client Metrics
//!
//! Lock-free request and job counters shared by all clones of a client.

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for REST traffic and job polling
#[derive(Debug)]
pub struct ClientMetrics {
    /// Requests sent to the controller
    pub requests: AtomicU64,
    /// Requests that failed in transport or returned a non-2xx status
    pub request_errors: AtomicU64,
    /// Additional collection pages fetched by following next links
    pub pages_followed: AtomicU64,
    /// Jobs polled to completion
    pub jobs_polled: AtomicU64,
    /// Jobs that finished in the failure state
    pub jobs_failed: AtomicU64,
    /// Last update timestamp (Unix millis)
    pub last_update_ms: AtomicU64,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            request_errors: AtomicU64::new(0),
            pages_followed: AtomicU64::new(0),
            jobs_polled: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            last_update_ms: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    #[inline]
    pub fn record_request_error(&self) {
        self.request_errors.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    #[inline]
    pub fn record_page_followed(&self) {
        self.pages_followed.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Record a job that reached a terminal state
    #[inline]
    pub fn record_job(&self, failed: bool) {
        self.jobs_polled.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.touch();
    }

    #[inline]
    fn touch(&self) {
        self.last_update_ms
            .store(Utc::now().timestamp_millis() as u64, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            request_errors: self.request_errors.load(Ordering::Relaxed),
            pages_followed: self.pages_followed.load(Ordering::Relaxed),
            jobs_polled: self.jobs_polled.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            last_update_ms: self.last_update_ms.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`ClientMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub request_errors: u64,
    pub pages_followed: u64,
    pub jobs_polled: u64,
    pub jobs_failed: u64,
    pub last_update_ms: u64,
}

impl MetricsSnapshot {
    /// Fraction of requests that failed
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.request_errors as f64 / self.requests as f64
        }
    }
}
