//! Parsers for `/proc` counter files.
//!
//! These are pure functions that parse the content of `/proc/stat` and
//! `/proc/meminfo` into structured data. They are designed to be easily
//! testable with string inputs.

use crate::memory::MemoryCounters;
use tracing::trace;

/// Minimum whitespace-separated tokens in a usable CPU row: the label plus
/// ten counters (user .. guest_nice).
pub const CPU_ROW_MIN_TOKENS: usize = 11;

/// Error type for a line that cannot be turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Cumulative tick counters of one CPU row from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreCounterSample {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CoreCounterSample {
    /// Returns true for the aggregate row summing all cores.
    pub fn is_aggregate(&self) -> bool {
        self.cpu_id.is_none()
    }

    /// Ticks spent doing work: everything except idle and iowait.
    pub fn busy_ticks(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .into_iter()
        .fold(0u64, u64::saturating_add)
    }

    /// Busy ticks plus idle and iowait.
    pub fn total_ticks(&self) -> u64 {
        self.busy_ticks()
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
    }
}

/// Parses a single `cpu`/`cpuN` row.
///
/// Counters that fail to parse are read as 0 so one garbled field does not
/// discard the whole row.
pub fn parse_cpu_line(line: &str) -> Result<CoreCounterSample, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(label) = parts.first() else {
        return Err(ParseError::new("empty line"));
    };

    let Some(suffix) = label.strip_prefix("cpu") else {
        return Err(ParseError::new(format!("not a cpu row: '{label}'")));
    };
    let cpu_id = if suffix.is_empty() {
        None
    } else {
        let id = suffix
            .parse::<u32>()
            .map_err(|_| ParseError::new(format!("bad cpu label: '{label}'")))?;
        Some(id)
    };

    if parts.len() < CPU_ROW_MIN_TOKENS {
        return Err(ParseError::new(format!(
            "{label}: expected at least {CPU_ROW_MIN_TOKENS} tokens, got {}",
            parts.len()
        )));
    }

    let get_val = |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

    Ok(CoreCounterSample {
        cpu_id,
        user: get_val(1),
        nice: get_val(2),
        system: get_val(3),
        idle: get_val(4),
        iowait: get_val(5),
        irq: get_val(6),
        softirq: get_val(7),
        steal: get_val(8),
        guest: get_val(9),
        guest_nice: get_val(10),
    })
}

/// Parses `/proc/stat` content into CPU rows, in kernel order.
///
/// Non-CPU lines (`intr`, `ctxt`, ...) are ignored; malformed CPU rows are
/// skipped and the rest of the file is still returned.
pub fn parse_cpu_stat(content: &str) -> Vec<CoreCounterSample> {
    let mut cpus = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with("cpu") {
            continue;
        }
        match parse_cpu_line(line) {
            Ok(sample) => cpus.push(sample),
            Err(e) => trace!("skipping cpu row: {}", e),
        }
    }

    cpus
}

/// Parses `/proc/meminfo` content into raw kB counters keyed by field name.
///
/// Accepts `Label: value [unit]` lines; anything else is skipped.
pub fn parse_meminfo(content: &str) -> MemoryCounters {
    let mut counters = MemoryCounters::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(label), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(key) = label.strip_suffix(':') else {
            trace!("skipping meminfo line without label: {:?}", line);
            continue;
        };
        match value.parse::<u64>() {
            Ok(kb) => counters.insert(key, kb),
            Err(_) => trace!("skipping meminfo line with bad value: {:?}", line),
        }
    }

    counters
}
