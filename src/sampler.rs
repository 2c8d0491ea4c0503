//! The metrics sampler: one pass over the process table per call.
//!
//! For each enumerated pid the sampler reads the raw attributes from its
//! [`ProcessSource`], derives instantaneous CPU percent, folds it into the
//! smoothing cache and emits a [`ProcessRecord`]. Processes that vanished or
//! that the caller may not inspect are skipped; any other read failure
//! aborts the pass. After a successful pass, cache entries for pids that
//! were not sampled are evicted.

use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, trace};

use crate::cpu::CpuTracker;
use crate::error::SampleError;
use crate::record::ProcessRecord;
use crate::smoothing::SmoothingCache;
use crate::source::{CpuReading, ProcessSource, RawProcess};

/// Why a process was left out of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    AccessDenied,
    Vanished,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AccessDenied => f.write_str("access-denied"),
            SkipReason::Vanished => f.write_str("vanished"),
        }
    }
}

/// Result of sampling a single process.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Record(ProcessRecord),
    Skipped(SkipReason),
}

/// Bookkeeping for one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleReport {
    pub generation: u64,
    pub enumerated: usize,
    pub records: usize,
    pub skipped_access_denied: usize,
    pub skipped_vanished: usize,
    pub evicted: usize,
    pub duration_seconds: f64,
}

impl SampleReport {
    pub fn skipped(&self) -> usize {
        self.skipped_access_denied + self.skipped_vanished
    }

    fn count_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::AccessDenied => self.skipped_access_denied += 1,
            SkipReason::Vanished => self.skipped_vanished += 1,
        }
    }
}

/// Sampler over a process source, owning the per-pid CPU and smoothing state.
pub struct Sampler<S> {
    source: S,
    smoothing: SmoothingCache,
    cpu: CpuTracker,
}

/// Sampler type used by the server, erased over the source.
pub type DynSampler = Sampler<Box<dyn ProcessSource>>;

impl<S: ProcessSource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            smoothing: SmoothingCache::new(),
            cpu: CpuTracker::new(),
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn smoothing(&self) -> &SmoothingCache {
        &self.smoothing
    }

    /// Samples every visible process. Order follows the source's enumeration.
    pub fn sample(&mut self) -> Result<Vec<ProcessRecord>, SampleError> {
        self.sample_with_report().map(|(records, _)| records)
    }

    /// Like [`Sampler::sample`], also returning the pass report.
    #[instrument(skip(self))]
    pub fn sample_with_report(
        &mut self,
    ) -> Result<(Vec<ProcessRecord>, SampleReport), SampleError> {
        let start = Instant::now();
        let generation = self.smoothing.begin_generation();
        self.cpu.begin_generation();

        let pids = self.source.pids()?;
        let mut report = SampleReport {
            generation,
            enumerated: pids.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.sample_pid(pid)? {
                Outcome::Record(record) => records.push(record),
                Outcome::Skipped(reason) => {
                    trace!("Skipping process {}: {}", pid, reason);
                    report.count_skip(reason);
                }
            }
        }

        report.evicted = self.smoothing.evict_stale();
        self.cpu.evict_stale();
        report.records = records.len();
        report.duration_seconds = start.elapsed().as_secs_f64();

        debug!(
            "Sample pass {} completed: {} enumerated, {} records, {} access-denied, {} vanished, {} evicted, {:.2}ms",
            generation,
            report.enumerated,
            report.records,
            report.skipped_access_denied,
            report.skipped_vanished,
            report.evicted,
            report.duration_seconds * 1000.0
        );

        Ok((records, report))
    }

    /// Samples a single pid as part of the current generation.
    pub fn sample_one(&mut self, pid: u32) -> Result<Outcome, SampleError> {
        self.sample_pid(pid)
    }

    fn sample_pid(&mut self, pid: u32) -> Result<Outcome, SampleError> {
        let raw = match self.source.read(pid) {
            Ok(raw) => raw,
            Err(e) => {
                return match e.skip_reason() {
                    Some(reason) => Ok(Outcome::Skipped(reason)),
                    None => Err(SampleError::Read { pid, source: e }),
                }
            }
        };

        let instant = match raw.cpu {
            CpuReading::Clock(clock) => self.cpu.percent(pid, clock),
            CpuReading::Percent(p) => p,
        };
        let smoothed = self.smoothing.smooth(pid, instant);

        Ok(Outcome::Record(into_record(raw, instant, smoothed)))
    }
}

fn into_record(raw: RawProcess, instant: f64, smoothed: f64) -> ProcessRecord {
    ProcessRecord {
        cmdline: raw.cmdline,
        cpu_percent: instant,
        cpu_percent_slow: smoothed,
        cpu_time_system: raw.cpu_time_system,
        cpu_time_user: raw.cpu_time_user,
        exe: raw.exe,
        name: raw.name,
        num_fds: raw.num_fds,
        num_threads: raw.num_threads,
        pid: raw.pid,
        rss: raw.rss,
        status: raw.status,
        username: raw.username,
        vms: raw.vms,
    }
}
