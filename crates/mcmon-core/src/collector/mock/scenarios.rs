//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` states for exercising the
//! reader, the delta engine and the scheduler.

use super::filesystem::MockFs;

impl MockFs {
    /// A four-core machine with swap configured.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        3072000 kB
Dirty:              1024 kB
Writeback:           512 kB
Slab:             512000 kB
SReclaimable:     256000 kB
HugePages_Total:       0
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs
    }

    /// A machine without swap and with memory nearly exhausted.
    pub fn no_swap() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:           1000 kB
MemFree:             100 kB
MemAvailable:        400 kB
Buffers:              50 kB
Cached:              200 kB
SwapTotal:             0 kB
SwapFree:              0 kB
Dirty:                10 kB
Writeback:             5 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  100 0 50 850 0 0 0 0 0 0
cpu0 100 0 50 850 0 0 0 0 0 0
",
        );

        fs
    }

    /// A machine whose `/proc/stat` carries noise: a truncated core row,
    /// a garbled counter and unrelated `cpu`-prefixed labels.
    pub fn noisy_stat() -> Self {
        let mut fs = Self::typical_system();

        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750
cpu2 2500 x25 750 20000 250 50 25 0 0 0
cpufreq 1 2 3 4 5 6 7 8 9 10

ctxt 500000
",
        );

        fs
    }

    /// Replaces `/proc/stat` with the given CPU rows (one `cpu*` line each).
    pub fn set_cpu_rows(&mut self, rows: &[&str]) {
        let mut content = rows.join("\n");
        content.push('\n');
        self.add_file("/proc/stat", content);
    }
}
