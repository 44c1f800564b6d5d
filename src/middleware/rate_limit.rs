//! Denial-of-service protection: per-client request counters split by read
//! and write traffic, with blacklist/whitelist overrides.
//!
//! Counters live in two independent tables (one per traffic class) and are
//! evicted one second after their last access. Eviction is lazy on access;
//! a periodic [`DosGuard::sweep`] only bounds map growth. The first request
//! from an unseen client creates its counter at zero and is never counted.

use axum::http::Method;
use dashmap::DashMap;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::DosConfig;

/// Sliding admission window: entries expire this long after last access.
const WINDOW: Duration = Duration::from_secs(1);

/// Coarse classification of an HTTP method for independent thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrafficClass {
    Read,
    Write,
}

impl TrafficClass {
    /// GET counts as read, everything else as write.
    pub fn from_method(method: &Method) -> Self {
        if method == Method::GET {
            TrafficClass::Read
        } else {
            TrafficClass::Write
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficClass::Read => "read",
            TrafficClass::Write => "write",
        }
    }
}

/// Outcome of evaluating one request against the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Admit { whitelisted: bool },
    Reject(RejectReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Client address extraction failed upstream; an infrastructure fault.
    MissingAddress,
    /// Address matched the blacklist pattern.
    Blacklisted,
    /// Per-class request threshold exceeded within the current window.
    RateExceeded { class: TrafficClass, limit: u64 },
}

struct RateCounter {
    count: AtomicU64,
    /// Milliseconds since the owning table's epoch.
    last_access_ms: AtomicU64,
}

struct CounterTable {
    epoch: Instant,
    entries: DashMap<String, RateCounter>,
}

impl CounterTable {
    fn new() -> Self {
        Self { epoch: Instant::now(), entries: DashMap::new() }
    }

    fn stamp(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Records one request for `address` and returns the pre-increment count,
    /// or `None` if the counter was freshly created (the creating request is
    /// always free). A stale entry counts as absent.
    ///
    /// The increment is a single `fetch_add`, so two concurrent requests can
    /// never both observe the same pre-increment value. Racing creations may
    /// overwrite each other; both represent "first request, start at zero".
    fn hit(&self, address: &str) -> Option<u64> {
        let now = self.stamp();

        if let Some(entry) = self.entries.get(address) {
            let last = entry.last_access_ms.load(Ordering::Acquire);
            if now.saturating_sub(last) <= WINDOW.as_millis() as u64 {
                entry.last_access_ms.store(now, Ordering::Release);
                return Some(entry.count.fetch_add(1, Ordering::AcqRel));
            }
        }

        self.entries.insert(
            address.to_string(),
            RateCounter { count: AtomicU64::new(0), last_access_ms: AtomicU64::new(now) },
        );
        None
    }

    /// Drops entries whose window has passed. Growth control only; the lazy
    /// staleness check in `hit` is what resets counts.
    fn sweep(&self) {
        let now = self.stamp();
        let window_ms = WINDOW.as_millis() as u64;
        self.entries.retain(|_, counter| {
            now.saturating_sub(counter.last_access_ms.load(Ordering::Acquire)) <= window_ms
        });
    }
}

/// Admission guard combining address lists and per-client rate accounting.
///
/// Check order is fixed: missing address, blacklist, whitelist, counters.
pub struct DosGuard {
    max_read: Option<u64>,
    max_write: Option<u64>,
    blacklist: Option<Regex>,
    whitelist: Option<Regex>,
    read_counters: CounterTable,
    write_counters: CounterTable,
}

impl DosGuard {
    /// Builds the guard from configuration, compiling the address-list
    /// patterns once. Pattern errors surface here, at startup.
    pub fn new(cfg: &DosConfig) -> anyhow::Result<Self> {
        let blacklist = match cfg.blacklist_pattern.as_deref() {
            Some(p) if !p.is_empty() => Some(Regex::new(p)?),
            _ => None,
        };
        let whitelist = match cfg.whitelist_pattern.as_deref() {
            Some(p) if !p.is_empty() => Some(Regex::new(p)?),
            _ => None,
        };
        Ok(Self {
            max_read: cfg.max_read_per_second,
            max_write: cfg.max_write_per_second,
            blacklist,
            whitelist,
            read_counters: CounterTable::new(),
            write_counters: CounterTable::new(),
        })
    }

    /// Decides whether to admit one request from `address`.
    ///
    /// An empty or `"unknown"` address signals that extraction failed
    /// upstream and is rejected as an infrastructure fault.
    pub fn evaluate(&self, address: &str, class: TrafficClass) -> GateDecision {
        if address.is_empty() || address.eq_ignore_ascii_case("unknown") {
            tracing::error!("Failed to determine peer address for incoming request");
            return GateDecision::Reject(RejectReason::MissingAddress);
        }

        if let Some(blacklist) = &self.blacklist {
            if blacklist.is_match(address) {
                tracing::info!(
                    target: "security.blacklist",
                    address,
                    "Blacklisted client tried to access the server"
                );
                return GateDecision::Reject(RejectReason::Blacklisted);
            }
        }

        if let Some(whitelist) = &self.whitelist {
            if whitelist.is_match(address) {
                return GateDecision::Admit { whitelisted: true };
            }
        }

        let (table, limit) = match class {
            TrafficClass::Read => (&self.read_counters, self.max_read),
            TrafficClass::Write => (&self.write_counters, self.max_write),
        };

        if let (Some(previous), Some(max)) = (table.hit(address), limit) {
            if previous > max {
                tracing::info!(
                    target: "security.dos",
                    address,
                    class = class.as_str(),
                    threshold = max,
                    "Client is above the configured request threshold"
                );
                return GateDecision::Reject(RejectReason::RateExceeded { class, limit: max });
            }
        }

        GateDecision::Admit { whitelisted: false }
    }

    /// Evicts expired counters from both tables.
    pub fn sweep(&self) {
        self.read_counters.sweep();
        self.write_counters.sweep();
    }
}
