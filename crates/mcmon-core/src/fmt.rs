//! Formatting helpers for the textual summary.
//!
//! All pure formatting functions (no layout, no styling) live here.

use crate::snapshot::Snapshot;

/// Format a kB count as a human-readable size.
///
/// `"512 KiB"`, `"2.00 MiB"`, `"2.00 GiB"`
pub fn format_kib(kb: u64) -> String {
    const KIB_PER_MIB: u64 = 1024;
    const KIB_PER_GIB: u64 = 1024 * 1024;

    let f = kb as f64;
    if kb < KIB_PER_MIB {
        format!("{} KiB", kb)
    } else if kb < KIB_PER_GIB {
        format!("{:.2} MiB", f / 1024.0)
    } else {
        format!("{:.2} GiB", f / 1024.0 / 1024.0)
    }
}

/// Format a ratio in `[0, 1]` as a percentage number with two decimals
/// (no `%` sign): `0.1667` -> `"16.67"`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}", ratio * 100.0)
}

/// Builds the multi-line summary label.
///
/// The CPU line appears only when aggregate usage is known; the memory and
/// swap lines only when memory statistics are available.
pub fn format_label(snapshot: &Snapshot) -> String {
    let mut lines = Vec::new();

    if let Some(total) = snapshot.total_usage {
        lines.push(format!("CPU usage: {}%", format_percent(total)));
    }

    if let Some(mem) = &snapshot.memory {
        lines.push(format!(
            "Memory usage: {} / {} ({}%)",
            format_kib(mem.used),
            format_kib(mem.total),
            format_percent(mem.usage)
        ));
        lines.push(format!("Cached: {}", format_kib(mem.cached)));
        lines.push(format!("Buffers: {}", format_kib(mem.buffers)));
        lines.push(format!(
            "Dirty / Writeback: {}",
            format_kib(mem.dirty_writeback)
        ));
        lines.push(format!(
            "Swap: {} / {} ({}%)",
            format_kib(mem.swap_used),
            format_kib(mem.swap_total),
            format_percent(mem.swap_usage)
        ));
    }

    lines.join("\n")
}

/// One line per core, `cpu<N>: <pct>%`.
pub fn format_core_lines(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .per_core_usage
        .iter()
        .map(|core| format!("cpu{}: {}%", core.cpu_id, format_percent(core.usage)))
        .collect()
}
