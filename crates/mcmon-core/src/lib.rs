//! mcmon-core — per-core CPU and memory utilization sampling.
//!
//! Provides:
//! - `collector` — `/proc` counter reading (real and mock filesystems)
//! - `usage` — CPU usage from cumulative tick counters
//! - `memory` — memory and swap statistics
//! - `snapshot` — the data set handed to the presentation layer
//! - `sampler` — one sampling pass
//! - `scheduler` — periodic sampling on a worker thread
//! - `fmt` — formatting helpers (sizes, percentages, summary label)

pub mod collector;
pub mod fmt;
pub mod memory;
pub mod sampler;
pub mod scheduler;
pub mod snapshot;
pub mod usage;

pub use sampler::Sampler;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use snapshot::Snapshot;
