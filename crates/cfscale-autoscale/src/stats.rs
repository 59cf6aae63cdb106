//! Operational counters for the autoscaler loop.
//!
//! Counters are plain atomics shared through an `Arc`; they only ever
//! grow and are read by the status and metrics endpoints.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Counters updated by the [`Autoscaler`](crate::Autoscaler).
#[derive(Debug, Default)]
pub struct AutoscaleStats {
    ticks_completed: AtomicU64,
    ticks_skipped: AtomicU64,
    apps_evaluated: AtomicU64,
    scale_ups: AtomicU64,
    scale_downs: AtomicU64,
    decision_errors: AtomicU64,
    scale_failures: AtomicU64,
    invariant_violations: AtomicU64,
    last_tick_epoch: AtomicU64,
}

/// Point-in-time copy of [`AutoscaleStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
    pub apps_evaluated: u64,
    pub scale_ups: u64,
    pub scale_downs: u64,
    pub decision_errors: u64,
    pub scale_failures: u64,
    pub invariant_violations: u64,
    /// Unix timestamp of the last completed tick, 0 if none yet.
    pub last_tick_epoch: u64,
}

impl AutoscaleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick_completed(&self) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
        self.last_tick_epoch.store(epoch_secs(), Ordering::Relaxed);
    }

    pub(crate) fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_app_evaluated(&self) {
        self.apps_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scale(&self, from: u32, to: u32) {
        if to > from {
            self.scale_ups.fetch_add(1, Ordering::Relaxed);
        } else {
            self.scale_downs.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_decision_error(&self) {
        self.decision_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scale_failure(&self) {
        self.scale_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            apps_evaluated: self.apps_evaluated.load(Ordering::Relaxed),
            scale_ups: self.scale_ups.load(Ordering::Relaxed),
            scale_downs: self.scale_downs.load(Ordering::Relaxed),
            decision_errors: self.decision_errors.load(Ordering::Relaxed),
            scale_failures: self.scale_failures.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
            last_tick_epoch: self.last_tick_epoch.load(Ordering::Relaxed),
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
