//! Periodic driver for the sampler.
//!
//! A `Scheduler` moves a [`Sampler`] onto a dedicated worker thread and runs
//! one pass per interval until stopped. Passes never overlap: the thread
//! that owns the timer also owns the per-core baselines.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::collector::FileSystem;
use crate::sampler::Sampler;
use crate::snapshot::Snapshot;

/// Default refresh interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1500);

/// Upper bound on how long `stop` waits for a sleeping worker.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between the starts of consecutive passes.
    pub interval: Duration,
    /// When a pass yields no data at all, hand the last non-empty snapshot
    /// to the consumer again instead of skipping the update.
    pub republish_last: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            republish_last: false,
        }
    }
}

impl SchedulerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_republish_last(mut self, republish_last: bool) -> Self {
        self.republish_last = republish_last;
        self
    }
}

/// Handle to a running sampling loop.
///
/// Dropping the handle stops the loop.
pub struct Scheduler {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Starts sampling on a new thread, publishing each snapshot to `consumer`.
    ///
    /// The first pass runs immediately. Fails if the interval is zero or the
    /// thread cannot be spawned.
    pub fn start<F, C>(
        sampler: Sampler<F>,
        config: SchedulerConfig,
        consumer: C,
    ) -> io::Result<Self>
    where
        F: FileSystem + 'static,
        C: FnMut(&Snapshot) + Send + 'static,
    {
        if config.interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "sampling interval must be greater than zero",
            ));
        }

        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));

        let handle = {
            let running = running.clone();
            let ticks = ticks.clone();
            std::thread::Builder::new()
                .name("mcmon-sampler".into())
                .spawn(move || run_loop(sampler, config, consumer, &running, &ticks))?
        };

        Ok(Self {
            running,
            ticks,
            handle: Some(handle),
        })
    }

    /// Stops the loop and waits for the worker to exit. Safe to call twice.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sampler thread panicked");
            }
            info!("Sampler stopped after {} ticks", self.ticks());
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
            && self.running.load(Ordering::SeqCst)
    }

    /// Number of passes completed so far, including passes without data.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<F, C>(
    mut sampler: Sampler<F>,
    config: SchedulerConfig,
    mut consumer: C,
    running: &AtomicBool,
    ticks: &AtomicU64,
) where
    F: FileSystem,
    C: FnMut(&Snapshot),
{
    info!("Sampler started, interval={:?}", config.interval);
    let mut next_tick = Instant::now();

    while running.load(Ordering::SeqCst) {
        let snapshot = sampler.sample();
        ticks.fetch_add(1, Ordering::SeqCst);

        if !snapshot.is_empty() {
            consumer(&snapshot);
        } else {
            warn!("No counters available this tick");
            if config.republish_last
                && let Some(last) = sampler.last_snapshot()
            {
                consumer(last);
            }
        }

        next_tick += config.interval;
        let now = Instant::now();
        if next_tick <= now {
            let mut skipped = 0u32;
            while next_tick <= now {
                next_tick += config.interval;
                skipped += 1;
            }
            debug!("Pass overran the interval, skipped {} tick(s)", skipped);
        }

        // Sleep with periodic checks for shutdown signal
        while running.load(Ordering::SeqCst) {
            let remaining = next_tick.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(STOP_POLL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use std::sync::mpsc;

    const TICK: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(5);

    fn wait_for(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_publishes_snapshots() {
        let (tx, rx) = mpsc::channel();
        let sampler = Sampler::new(MockFs::typical_system(), "/proc");
        let config = SchedulerConfig::default().with_interval(TICK);

        let mut scheduler = Scheduler::start(sampler, config, move |s: &Snapshot| {
            let _ = tx.send(s.clone());
        })
        .unwrap();

        let first = rx.recv_timeout(WAIT).unwrap();
        let second = rx.recv_timeout(WAIT).unwrap();
        scheduler.stop();

        assert_eq!(first.core_count(), 4);
        assert_eq!(second.core_count(), 4);
        assert!(scheduler.ticks() >= 2);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_keeps_ticking_without_sources() {
        let (tx, rx) = mpsc::channel();
        let mut fs = MockFs::new();
        let sampler = Sampler::new(fs.clone(), "/proc");
        let config = SchedulerConfig::default().with_interval(TICK);

        let scheduler = Scheduler::start(sampler, config, move |s: &Snapshot| {
            let _ = tx.send(s.clone());
        })
        .unwrap();

        assert!(wait_for(|| scheduler.ticks() >= 3));
        assert!(rx.try_recv().is_err());

        let typical = MockFs::typical_system();
        for name in ["/proc/stat", "/proc/meminfo"] {
            let content = typical.read_to_string(std::path::Path::new(name)).unwrap();
            fs.add_file(name, content);
        }

        let snapshot = rx.recv_timeout(WAIT).unwrap();
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_republishes_last_snapshot() {
        let (tx, rx) = mpsc::channel();
        let mut fs = MockFs::typical_system();
        let sampler = Sampler::new(fs.clone(), "/proc");
        let config = SchedulerConfig::default()
            .with_interval(TICK)
            .with_republish_last(true);

        let _scheduler = Scheduler::start(sampler, config, move |s: &Snapshot| {
            let _ = tx.send(s.clone());
        })
        .unwrap();

        let first = rx.recv_timeout(WAIT).unwrap();
        fs.remove_file("/proc/stat");
        fs.remove_file("/proc/meminfo");

        // Drain until the outage is visible; every update must still carry data.
        for _ in 0..5 {
            let snapshot = rx.recv_timeout(WAIT).unwrap();
            assert!(!snapshot.is_empty());
            assert_eq!(snapshot.core_count(), first.core_count());
        }
    }

    #[test]
    fn test_overrunning_pass_skips_missed_ticks() {
        const SLOW: Duration = Duration::from_millis(70);

        let (tx, rx) = mpsc::channel();
        let sampler = Sampler::new(MockFs::typical_system(), "/proc");
        let config = SchedulerConfig::default().with_interval(TICK);

        let mut scheduler = Scheduler::start(sampler, config, move |_: &Snapshot| {
            let _ = tx.send(Instant::now());
            std::thread::sleep(SLOW);
        })
        .unwrap();

        let starts: Vec<Instant> = (0..4).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        scheduler.stop();

        // A 70ms pass on a 20ms cadence lands the next start on the 80ms
        // boundary; replaying missed ticks would start it right at 70ms.
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(75), "gap {:?}", gap);
        }
        assert!(scheduler.ticks() >= 4);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let sampler = Sampler::new(MockFs::typical_system(), "/proc");
        let mut scheduler = Scheduler::start(
            sampler,
            SchedulerConfig::default().with_interval(Duration::from_secs(60)),
            |_: &Snapshot| {},
        )
        .unwrap();

        assert!(wait_for(|| scheduler.ticks() >= 1));
        let started = Instant::now();
        scheduler.stop();
        scheduler.stop();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let sampler = Sampler::new(MockFs::typical_system(), "/proc");
        let config = SchedulerConfig::default().with_interval(Duration::ZERO);

        let err = Scheduler::start(sampler, config, |_: &Snapshot| {})
            .err()
            .unwrap();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(SchedulerConfig::default().interval, Duration::from_millis(1500));
    }
}
