//! CPU utilization from cumulative `/proc/stat` tick counters.
//!
//! Kernel counters only ever grow (until reboot or wraparound), so usage over
//! a polling interval is the ratio of busy ticks to all ticks that elapsed
//! since the previous sample of the same CPU.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::collector::CoreCounterSample;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute u64 delta, returning `None` on counter regression (reset or wrap).
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Busy share of elapsed ticks, clamped to `[0, 1]`. Zero elapsed ticks is 0.
pub fn usage_ratio(busy_delta: u64, total_delta: u64) -> f64 {
    if total_delta == 0 {
        return 0.0;
    }
    (busy_delta as f64 / total_delta as f64).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Last observed tick sums for one CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreUsageState {
    pub last_busy_ticks: u64,
    pub last_total_ticks: u64,
}

/// Utilization of one physical core for the last interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoreUsage {
    pub cpu_id: u32,
    pub usage: f64,
}

/// Utilization derived from one `/proc/stat` read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUsage {
    /// Aggregate row, if it was present.
    pub total: Option<f64>,
    /// Physical cores present in the sample, in kernel order.
    pub per_core: Vec<CoreUsage>,
}

/// Turns successive cumulative samples into usage ratios.
///
/// State is keyed by CPU id, so cores that go offline simply stop updating
/// and cores that come online start from a fresh baseline.
#[derive(Debug, Default)]
pub struct UsageDeltaEngine {
    prev_sample: HashMap<Option<u32>, CoreUsageState>,
    anomalies: u64,
}

impl UsageDeltaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one CPU row and returns its usage since the previous row with
    /// the same CPU id.
    ///
    /// The first observation of a CPU has no baseline and yields 0. The
    /// sample always becomes the new baseline, even when the counters went
    /// backwards.
    pub fn update(&mut self, sample: &CoreCounterSample) -> f64 {
        let busy = sample.busy_ticks();
        let total = sample.total_ticks();
        let current = CoreUsageState {
            last_busy_ticks: busy,
            last_total_ticks: total,
        };

        match self.prev_sample.insert(sample.cpu_id, current) {
            None => 0.0,
            Some(prev) => match (
                du64(busy, prev.last_busy_ticks),
                du64(total, prev.last_total_ticks),
            ) {
                (Some(busy_delta), Some(total_delta)) => usage_ratio(busy_delta, total_delta),
                _ => {
                    self.anomalies += 1;
                    debug!(
                        "cpu {:?}: counters went backwards (busy {} -> {}, total {} -> {}), rebaselining",
                        sample.cpu_id, prev.last_busy_ticks, busy, prev.last_total_ticks, total
                    );
                    0.0
                }
            },
        }
    }

    /// Feeds every row of one `/proc/stat` read.
    ///
    /// Iteration follows the current sample, so CPUs missing from it are not
    /// reported even if state for them is retained.
    pub fn update_all(&mut self, samples: &[CoreCounterSample]) -> CpuUsage {
        let mut result = CpuUsage::default();

        for sample in samples {
            let usage = self.update(sample);
            match sample.cpu_id {
                None => result.total = Some(usage),
                Some(cpu_id) => result.per_core.push(CoreUsage { cpu_id, usage }),
            }
        }

        result
    }

    /// Retained baseline for a CPU (`None` = aggregate row).
    pub fn state(&self, cpu_id: Option<u32>) -> Option<&CoreUsageState> {
        self.prev_sample.get(&cpu_id)
    }

    /// Number of CPUs (including the aggregate row) with a baseline.
    pub fn tracked_cores(&self) -> usize {
        self.prev_sample.len()
    }

    /// Number of counter regressions observed so far.
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// Drops all baselines; the next sample of every CPU yields 0.
    pub fn reset(&mut self) {
        self.prev_sample.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::procfs::parser::parse_cpu_line;

    fn row(line: &str) -> CoreCounterSample {
        parse_cpu_line(line).unwrap()
    }

    #[test]
    fn test_first_observation_is_zero() {
        let mut engine = UsageDeltaEngine::new();
        assert_eq!(engine.update(&row("cpu 100 0 50 850 0 0 0 0 0 0")), 0.0);
        assert_eq!(engine.tracked_cores(), 1);
    }

    #[test]
    fn test_usage_between_two_samples() {
        let mut engine = UsageDeltaEngine::new();
        engine.update(&row("cpu 100 0 50 850 0 0 0 0 0 0"));

        let usage = engine.update(&row("cpu 200 0 100 1700 0 0 0 0 0 0"));

        // busy 150 -> 300, total 1000 -> 2000
        assert!((usage - 0.15).abs() < 1e-9);
        let state = engine.state(None).unwrap();
        assert_eq!(state.last_busy_ticks, 300);
        assert_eq!(state.last_total_ticks, 2000);
    }

    #[test]
    fn test_iowait_counts_as_not_busy() {
        let mut engine = UsageDeltaEngine::new();
        engine.update(&row("cpu0 0 0 0 0 0 0 0 0 0 0"));

        let usage = engine.update(&row("cpu0 0 0 0 0 100 0 0 0 0 0"));

        assert_eq!(usage, 0.0);
    }

    #[test]
    fn test_identical_samples_yield_zero() {
        let mut engine = UsageDeltaEngine::new();
        let sample = row("cpu1 10 20 30 40 50 60 70 80 90 100");
        engine.update(&sample);

        let usage = engine.update(&sample);

        assert_eq!(usage, 0.0);
        assert!(!usage.is_nan());
        assert_eq!(engine.anomalies(), 0);
    }

    #[test]
    fn test_counter_reset_rebaselines() {
        let mut engine = UsageDeltaEngine::new();
        engine.update(&row("cpu 5000 0 5000 90000 0 0 0 0 0 0"));

        // reboot-like reset: everything smaller than before
        let usage = engine.update(&row("cpu 10 0 10 100 0 0 0 0 0 0"));
        assert_eq!(usage, 0.0);
        assert_eq!(engine.anomalies(), 1);

        // the next interval measures from the reset values
        let usage = engine.update(&row("cpu 60 0 10 150 0 0 0 0 0 0"));
        assert!((usage - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_busy_regression_with_total_growth_clamps_to_zero() {
        let mut engine = UsageDeltaEngine::new();
        engine.update(&row("cpu 500 0 0 100 0 0 0 0 0 0"));

        let usage = engine.update(&row("cpu 400 0 0 900 0 0 0 0 0 0"));

        assert_eq!(usage, 0.0);
    }

    #[test]
    fn test_usage_stays_in_unit_interval() {
        let mut engine = UsageDeltaEngine::new();
        let rows = [
            "cpu 0 0 0 0 0 0 0 0 0 0",
            "cpu 100 0 0 0 0 0 0 0 0 0",
            "cpu 100 0 0 100 0 0 0 0 0 0",
            "cpu 150 10 10 130 0 5 5 0 0 0",
            "cpu 150 10 10 130 7 5 5 1 1 1",
        ];
        for line in rows {
            let usage = engine.update(&row(line));
            assert!((0.0..=1.0).contains(&usage), "{line}: {usage}");
        }
    }

    #[test]
    fn test_update_all_separates_aggregate_and_cores() {
        let mut engine = UsageDeltaEngine::new();
        engine.update_all(&[
            row("cpu  0 0 0 0 0 0 0 0 0 0"),
            row("cpu0 0 0 0 0 0 0 0 0 0 0"),
            row("cpu1 0 0 0 0 0 0 0 0 0 0"),
        ]);

        let usage = engine.update_all(&[
            row("cpu  50 0 0 150 0 0 0 0 0 0"),
            row("cpu0 50 0 0 50 0 0 0 0 0 0"),
            row("cpu1 0 0 0 100 0 0 0 0 0 0"),
        ]);

        assert_eq!(usage.total, Some(0.25));
        assert_eq!(
            usage.per_core,
            vec![
                CoreUsage { cpu_id: 0, usage: 0.5 },
                CoreUsage { cpu_id: 1, usage: 0.0 },
            ]
        );
    }

    #[test]
    fn test_core_hotplug() {
        let mut engine = UsageDeltaEngine::new();
        engine.update_all(&[
            row("cpu0 0 0 0 0 0 0 0 0 0 0"),
            row("cpu1 0 0 0 0 0 0 0 0 0 0"),
        ]);

        // cpu1 goes offline
        let usage = engine.update_all(&[row("cpu0 10 0 0 10 0 0 0 0 0 0")]);
        assert_eq!(usage.total, None);
        assert_eq!(usage.per_core.len(), 1);
        assert_eq!(engine.tracked_cores(), 2);

        // cpu1 comes back, cpu2 appears for the first time
        let usage = engine.update_all(&[
            row("cpu0 20 0 0 20 0 0 0 0 0 0"),
            row("cpu1 30 0 0 10 0 0 0 0 0 0"),
            row("cpu2 30 0 0 10 0 0 0 0 0 0"),
        ]);
        assert_eq!(usage.per_core[0].usage, 0.5);
        assert_eq!(usage.per_core[1].usage, 0.75);
        assert_eq!(usage.per_core[2].usage, 0.0);
    }

    #[test]
    fn test_reset_drops_baselines() {
        let mut engine = UsageDeltaEngine::new();
        engine.update(&row("cpu 1 1 1 1 1 1 1 1 1 1"));
        engine.reset();

        assert_eq!(engine.tracked_cores(), 0);
        assert_eq!(engine.update(&row("cpu 9 9 9 9 9 9 9 9 9 9")), 0.0);
    }

    #[test]
    fn test_usage_ratio_guards() {
        assert_eq!(usage_ratio(10, 0), 0.0);
        assert_eq!(usage_ratio(20, 10), 1.0);
        assert_eq!(du64(5, 10), None);
        assert_eq!(du64(10, 5), Some(5));
    }
}
