//! One sampling pass: read counters, derive usage, assemble a snapshot.
//!
//! The `Sampler` owns the delta engine, so whoever owns the sampler owns the
//! per-core baselines. The scheduler moves it onto its worker thread.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::collector::{CounterReader, FileSystem};
use crate::memory::MemorySnapshot;
use crate::snapshot::Snapshot;
use crate::usage::UsageDeltaEngine;

/// Timing information for the phases of the last pass.
#[derive(Debug, Clone, Default)]
pub struct SampleTiming {
    /// Total pass time.
    pub total: Duration,
    /// Time to read and derive CPU usage.
    pub cpu: Duration,
    /// Time to read and derive memory statistics.
    pub memory: Duration,
}

/// Combines the counter reader, the delta engine and the memory builder.
pub struct Sampler<F: FileSystem> {
    reader: CounterReader<F>,
    engine: UsageDeltaEngine,
    last_snapshot: Option<Snapshot>,
    last_timing: Option<SampleTiming>,
}

impl<F: FileSystem> Sampler<F> {
    /// Creates a new sampler.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_reader(CounterReader::new(fs, proc_path))
    }

    pub fn with_reader(reader: CounterReader<F>) -> Self {
        Self {
            reader,
            engine: UsageDeltaEngine::new(),
            last_snapshot: None,
            last_timing: None,
        }
    }

    /// Runs one pass.
    ///
    /// A failing source only blanks its own part of the snapshot: CPU usage
    /// is still reported when memory is unavailable and vice versa.
    pub fn sample(&mut self) -> Snapshot {
        let start = Instant::now();
        let mut timing = SampleTiming::default();

        let cpus = self.reader.read_cpu_counters();
        let cpu = self.engine.update_all(&cpus);
        timing.cpu = start.elapsed();

        let mem_start = Instant::now();
        let counters = self.reader.read_memory_counters();
        let memory = if counters.is_empty() {
            None
        } else {
            match MemorySnapshot::from_counters(&counters) {
                Ok(memory) => Some(memory),
                Err(e) => {
                    warn!("memory statistics unavailable: {}", e);
                    None
                }
            }
        };
        timing.memory = mem_start.elapsed();

        let snapshot = Snapshot {
            timestamp: chrono::Utc::now().timestamp(),
            total_usage: cpu.total,
            per_core_usage: cpu.per_core,
            memory,
        };

        timing.total = start.elapsed();
        debug!(
            "sampled {} cores in {:?} (cpu {:?}, memory {:?})",
            snapshot.core_count(),
            timing.total,
            timing.cpu,
            timing.memory
        );
        self.last_timing = Some(timing);

        if !snapshot.is_empty() {
            self.last_snapshot = Some(snapshot.clone());
        }
        snapshot
    }

    /// Last snapshot that carried any data.
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    /// Returns timing information from the last `sample` call.
    pub fn last_timing(&self) -> Option<&SampleTiming> {
        self.last_timing.as_ref()
    }

    pub fn engine(&self) -> &UsageDeltaEngine {
        &self.engine
    }
}
