//! The data set handed to the presentation layer after each sampling pass.

use serde::Serialize;

use crate::memory::{MemoryBreakdown, MemorySnapshot};
use crate::usage::CoreUsage;

/// One self-consistent reading of CPU and memory utilization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Unix timestamp (seconds) of the pass that produced this snapshot.
    pub timestamp: i64,
    /// Aggregate CPU usage in `[0, 1]`; `None` if no aggregate row was read.
    pub total_usage: Option<f64>,
    /// Per-core usage in `[0, 1]`, in kernel order.
    pub per_core_usage: Vec<CoreUsage>,
    /// `None` when `/proc/meminfo` was unreadable or incomplete.
    pub memory: Option<MemorySnapshot>,
}

impl Snapshot {
    /// True when neither CPU nor memory data was obtained.
    pub fn is_empty(&self) -> bool {
        self.total_usage.is_none() && self.per_core_usage.is_empty() && self.memory.is_none()
    }

    pub fn core_count(&self) -> usize {
        self.per_core_usage.len()
    }

    pub fn memory_breakdown(&self) -> Option<MemoryBreakdown> {
        self.memory.as_ref().map(MemorySnapshot::breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_empty() {
        assert!(Snapshot::default().is_empty());
    }

    #[test]
    fn test_cpu_only_snapshot_is_not_empty() {
        let snapshot = Snapshot {
            total_usage: Some(0.0),
            ..Snapshot::default()
        };
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.memory_breakdown(), None);
    }

    #[test]
    fn test_serializes_to_json() {
        let snapshot = Snapshot {
            timestamp: 1700000000,
            total_usage: Some(0.5),
            per_core_usage: vec![CoreUsage {
                cpu_id: 0,
                usage: 0.5,
            }],
            memory: None,
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["timestamp"], 1700000000);
        assert_eq!(json["total_usage"], 0.5);
        assert_eq!(json["per_core_usage"][0]["cpu_id"], 0);
        assert!(json["memory"].is_null());
    }
}
