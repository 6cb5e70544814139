//! Memory statistics derived from a single `/proc/meminfo` read.
//!
//! All values are kB as reported by the kernel.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::collector::CollectError;

/// Raw `/proc/meminfo` values keyed by kernel field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    fields: BTreeMap<String, u64>,
}

impl MemoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, kb: u64) {
        self.fields.insert(key.into(), kb);
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.fields.get(key).copied()
    }

    /// Returns the value of a field that derivation cannot do without.
    pub fn require(&self, key: &'static str) -> Result<u64, CollectError> {
        self.get(key).ok_or(CollectError::MissingCounter(key))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for MemoryCounters {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut counters = Self::new();
        for (key, kb) in iter {
            counters.insert(key, kb);
        }
        counters
    }
}

/// Derived memory and swap figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    /// `total - available`.
    pub used: u64,
    pub buffers: u64,
    pub cached: u64,
    pub dirty: u64,
    pub writeback: u64,
    pub dirty_writeback: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
    /// `used / total`, 0 when total is 0.
    pub usage: f64,
    /// `swap_used / swap_total`, 0 on swap-less systems.
    pub swap_usage: f64,
}

/// Share of total memory held by each category, plus swap usage.
///
/// Categories are laid out consecutively by the presentation layer (pie or
/// stacked bar), so each share is clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryBreakdown {
    pub used: f64,
    pub cached: f64,
    pub buffers: f64,
    pub dirty_writeback: f64,
    pub swap: f64,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).clamp(0.0, 1.0)
}

impl MemorySnapshot {
    /// Derives the snapshot from raw counters.
    ///
    /// Fails with [`CollectError::MissingCounter`] if any field it reports on
    /// is absent.
    pub fn from_counters(counters: &MemoryCounters) -> Result<Self, CollectError> {
        let total = counters.require("MemTotal")?;
        let free = counters.require("MemFree")?;
        let available = counters.require("MemAvailable")?;
        let buffers = counters.require("Buffers")?;
        let cached = counters.require("Cached")?;
        let dirty = counters.require("Dirty")?;
        let writeback = counters.require("Writeback")?;
        let swap_total = counters.require("SwapTotal")?;
        let swap_free = counters.require("SwapFree")?;

        let used = total.saturating_sub(available);
        let swap_used = swap_total.saturating_sub(swap_free);

        Ok(Self {
            total,
            free,
            available,
            used,
            buffers,
            cached,
            dirty,
            writeback,
            dirty_writeback: dirty.saturating_add(writeback),
            swap_total,
            swap_used,
            swap_free,
            usage: ratio(used, total),
            swap_usage: ratio(swap_used, swap_total),
        })
    }

    pub fn breakdown(&self) -> MemoryBreakdown {
        MemoryBreakdown {
            used: ratio(self.used, self.total),
            cached: ratio(self.cached, self.total),
            buffers: ratio(self.buffers, self.total),
            dirty_writeback: ratio(self.dirty_writeback, self.total),
            swap: self.swap_usage,
        }
    }
}
