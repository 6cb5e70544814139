//! Counter reader for `/proc/stat` and `/proc/meminfo`.

use crate::collector::procfs::parser::{CoreCounterSample, parse_cpu_stat, parse_meminfo};
use crate::collector::traits::FileSystem;
use crate::memory::MemoryCounters;
use std::path::PathBuf;
use tracing::warn;

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// Counter file could not be read.
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A memory field required for derivation is absent.
    MissingCounter(&'static str),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::SourceUnavailable { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            CollectError::MissingCounter(key) => write!(f, "missing counter: {}", key),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::SourceUnavailable { source, .. } => Some(source),
            CollectError::MissingCounter(_) => None,
        }
    }
}

/// Reads raw CPU and memory counters from a proc filesystem.
pub struct CounterReader<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> CounterReader<F> {
    /// Creates a new counter reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Reads CPU rows from `/proc/stat`: aggregate first, then cores.
    pub fn try_read_cpu_counters(&self) -> Result<Vec<CoreCounterSample>, CollectError> {
        let content = self.read("stat")?;
        Ok(parse_cpu_stat(&content))
    }

    /// Reads raw kB counters from `/proc/meminfo`.
    pub fn try_read_memory_counters(&self) -> Result<MemoryCounters, CollectError> {
        let content = self.read("meminfo")?;
        Ok(parse_meminfo(&content))
    }

    /// Like [`Self::try_read_cpu_counters`], but an unreadable source yields
    /// an empty sequence ("no data this tick").
    pub fn read_cpu_counters(&self) -> Vec<CoreCounterSample> {
        self.try_read_cpu_counters().unwrap_or_else(|e| {
            warn!("{}", e);
            Vec::new()
        })
    }

    /// Like [`Self::try_read_memory_counters`], but an unreadable source
    /// yields an empty mapping.
    pub fn read_memory_counters(&self) -> MemoryCounters {
        self.try_read_memory_counters().unwrap_or_else(|e| {
            warn!("{}", e);
            MemoryCounters::new()
        })
    }

    fn read(&self, name: &str) -> Result<String, CollectError> {
        let path = self.proc_path.join(name);
        self.fs
            .read_to_string(&path)
            .map_err(|source| CollectError::SourceUnavailable { path, source })
    }
}
