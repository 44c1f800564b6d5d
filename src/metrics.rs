use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Admission and authentication counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Arc<AtomicU64>,
    pub requests_admitted: Arc<AtomicU64>,
    pub requests_whitelisted: Arc<AtomicU64>,
    pub rejected_missing_address: Arc<AtomicU64>,
    pub rejected_blacklist: Arc<AtomicU64>,
    pub rejected_rate_limit: Arc<AtomicU64>,
    pub auth_derived: Arc<AtomicU64>,
    pub auth_anonymous: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_admitted: Arc::new(AtomicU64::new(0)),
            requests_whitelisted: Arc::new(AtomicU64::new(0)),
            rejected_missing_address: Arc::new(AtomicU64::new(0)),
            rejected_blacklist: Arc::new(AtomicU64::new(0)),
            rejected_rate_limit: Arc::new(AtomicU64::new(0)),
            auth_derived: Arc::new(AtomicU64::new(0)),
            auth_anonymous: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_admitted(&self) {
        self.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_whitelisted(&self) {
        self.requests_whitelisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_missing_address(&self) {
        self.rejected_missing_address.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_blacklist(&self) {
        self.rejected_blacklist.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_rate_limit(&self) {
        self.rejected_rate_limit.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_auth_derived(&self) {
        self.auth_derived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_auth_anonymous(&self) {
        self.auth_anonymous.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_admitted: self.requests_admitted.load(Ordering::Relaxed),
            requests_whitelisted: self.requests_whitelisted.load(Ordering::Relaxed),
            rejected_missing_address: self.rejected_missing_address.load(Ordering::Relaxed),
            rejected_blacklist: self.rejected_blacklist.load(Ordering::Relaxed),
            rejected_rate_limit: self.rejected_rate_limit.load(Ordering::Relaxed),
            auth_derived: self.auth_derived.load(Ordering::Relaxed),
            auth_anonymous: self.auth_anonymous.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    /// Every request that reached a handler, whitelisted ones included.
    pub requests_admitted: u64,
    /// Subset of `requests_admitted` that bypassed counting via the whitelist.
    pub requests_whitelisted: u64,
    pub rejected_missing_address: u64,
    pub rejected_blacklist: u64,
    pub rejected_rate_limit: u64,
    pub auth_derived: u64,
    pub auth_anonymous: u64,
    pub uptime_seconds: u64,
}
