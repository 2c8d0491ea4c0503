//! Instantaneous CPU percent tracking.
//!
//! CPU percent is the CPU time a process consumed since the previous
//! measurement divided by the wall time that elapsed, times 100. A process
//! seen for the first time is measured against its own start, so its first
//! value covers its whole lifetime to date.

use ahash::AHashMap as HashMap;

/// CPU clock reading for one process. All values are seconds on the same
/// monotonic scale (seconds since boot on Linux).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuClock {
    /// User plus system CPU time consumed so far.
    pub cpu_seconds: f64,
    /// When the process started.
    pub start_seconds: f64,
    /// When this reading was taken.
    pub now_seconds: f64,
}

/// Last reading kept for a pid.
#[derive(Debug, Clone, Copy)]
struct CpuEntry {
    cpu_seconds: f64,
    at_seconds: f64,
    start_seconds: f64,
    generation: u64,
}

/// Per-pid previous readings used to compute CPU percent deltas.
#[derive(Debug, Default)]
pub struct CpuTracker {
    entries: HashMap<u32, CpuEntry>,
    generation: u64,
}

impl CpuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Computes CPU percent for `pid` from `clock` and remembers the reading.
    ///
    /// A pid whose start time differs from the cached one has been reused
    /// and is measured against its own start again.
    pub fn percent(&mut self, pid: u32, clock: CpuClock) -> f64 {
        let (base_cpu, base_at) = match self.entries.get(&pid) {
            Some(prev) if prev.start_seconds == clock.start_seconds => {
                (prev.cpu_seconds, prev.at_seconds)
            }
            _ => (0.0, clock.start_seconds),
        };

        let dt = clock.now_seconds - base_at;
        let delta_cpu = clock.cpu_seconds - base_cpu;
        let percent = if dt > 0.0 && delta_cpu > 0.0 {
            (delta_cpu / dt) * 100.0
        } else {
            0.0
        };

        self.entries.insert(
            pid,
            CpuEntry {
                cpu_seconds: clock.cpu_seconds,
                at_seconds: clock.now_seconds,
                start_seconds: clock.start_seconds,
                generation: self.generation,
            },
        );

        percent
    }

    /// Drops readings of pids not measured during the current generation.
    pub fn evict_stale(&mut self) -> usize {
        let current = self.generation;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.generation == current);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(cpu: f64, start: f64, now: f64) -> CpuClock {
        CpuClock {
            cpu_seconds: cpu,
            start_seconds: start,
            now_seconds: now,
        }
    }

    #[test]
    fn test_first_reading_uses_lifetime_baseline() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        // 5 CPU seconds over 100 seconds of life
        let pct = t.percent(10, clock(5.0, 900.0, 1000.0));
        assert!((pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_reading_uses_delta() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        t.percent(10, clock(5.0, 900.0, 1000.0));
        t.begin_generation();
        // 1.5 CPU seconds over 2 wall seconds
        let pct = t.percent(10, clock(6.5, 900.0, 1002.0));
        assert!((pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_multi_core_can_exceed_100() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        t.percent(10, clock(0.0, 0.0, 10.0));
        let pct = t.percent(10, clock(4.0, 0.0, 11.0));
        assert!((pct - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_elapsed_time_is_zero() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        t.percent(10, clock(1.0, 0.0, 10.0));
        assert_eq!(t.percent(10, clock(2.0, 0.0, 10.0)), 0.0);
        // process started "now"
        assert_eq!(t.percent(11, clock(0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_pid_reuse_resets_baseline() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        t.percent(10, clock(50.0, 0.0, 100.0));
        // same pid, new process started at 98s with 1s of CPU
        let pct = t.percent(10, clock(1.0, 98.0, 100.0));
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_evict_stale() {
        let mut t = CpuTracker::new();
        t.begin_generation();
        t.percent(1, clock(1.0, 0.0, 10.0));
        t.percent(2, clock(1.0, 0.0, 10.0));
        t.begin_generation();
        t.percent(1, clock(2.0, 0.0, 12.0));
        assert_eq!(t.evict_stale(), 1);
        assert_eq!(t.len(), 1);
    }
}
