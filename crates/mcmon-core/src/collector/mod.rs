//! Kernel counter collection for Linux.
//!
//! This module reads raw CPU and memory counters from the `/proc` filesystem,
//! with support for mocking for testing off Linux.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              CounterReader               │
//! │   - /proc/stat     -> CoreCounterSample  │
//! │   - /proc/meminfo  -> MemoryCounters     │
//! └────────────────────┬─────────────────────┘
//!                      │
//!               ┌──────▼──────┐
//!               │  FileSystem │ (trait)
//!               └──────┬──────┘
//!          ┌───────────┼───────────┐
//!   ┌──────▼──────┐ ┌──▼──────────┐ ┌▼────────────┐
//!   │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!   │  (Linux)    │ │  (Testing)  │ │  (Fixtures) │
//!   └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use mcmon_core::collector::{CounterReader, MockFs};
//!
//! let reader = CounterReader::new(MockFs::typical_system(), "/proc");
//! let cpus = reader.read_cpu_counters();
//! assert_eq!(cpus.len(), 5);
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, CoreCounterSample, CounterReader, ParseError};
pub use traits::{FileSystem, RealFs};
