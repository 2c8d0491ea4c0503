//! Running statistics about sampling passes, rendered by `/health`.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::sampler::SampleReport;

/// Summary of one series of per-pass values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Summary {
    last: f64,
    mean: f64,
    max: f64,
    min: f64,
}

/// Incrementally maintained summary; the mean is derived from a running sum.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
    }

    fn summary(&self) -> Summary {
        let mean = if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        };
        Summary {
            last: self.last,
            mean,
            max: self.max,
            min: self.min,
        }
    }
}

/// Accumulator shared between request tasks.
#[derive(Default)]
struct Series(Mutex<Accumulator>);

impl Series {
    fn push(&self, value: f64) {
        if let Ok(mut acc) = self.0.lock() {
            acc.push(value);
        }
    }

    fn summary(&self) -> Summary {
        self.0.lock().map(|acc| acc.summary()).unwrap_or_default()
    }
}

/// Sampler and HTTP statistics since startup.
pub struct HealthStats {
    records: Series,
    skipped: Series,
    pass_duration_seconds: Series,
    total_passes: AtomicU64,
    failed_passes: AtomicU64,
    skipped_access_denied: AtomicU64,
    skipped_vanished: AtomicU64,
    http_requests: AtomicU64,
    last_pass_failed: AtomicBool,
    started: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            records: Series::default(),
            skipped: Series::default(),
            pass_duration_seconds: Series::default(),
            total_passes: AtomicU64::new(0),
            failed_passes: AtomicU64::new(0),
            skipped_access_denied: AtomicU64::new(0),
            skipped_vanished: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            last_pass_failed: AtomicBool::new(false),
            started: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_pass(&self, report: &SampleReport) {
        self.records.push(report.records as f64);
        self.skipped.push(report.skipped() as f64);
        self.pass_duration_seconds.push(report.duration_seconds);
        self.skipped_access_denied
            .fetch_add(report.skipped_access_denied as u64, Ordering::Relaxed);
        self.skipped_vanished
            .fetch_add(report.skipped_vanished as u64, Ordering::Relaxed);
        self.total_passes.fetch_add(1, Ordering::Relaxed);
        self.last_pass_failed.store(false, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_passes.fetch_add(1, Ordering::Relaxed);
        self.last_pass_failed.store(true, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_pass_failed(&self) -> bool {
        self.last_pass_failed.load(Ordering::Relaxed)
    }

    pub fn total_passes(&self) -> u64 {
        self.total_passes.load(Ordering::Relaxed)
    }

    pub fn failed_passes(&self) -> u64 {
        self.failed_passes.load(Ordering::Relaxed)
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "metric",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out, "{}", "-".repeat(left_col + 3 + (col_w + 3) * 4)).ok();

        let rows: [(&str, &Series, usize); 3] = [
            ("records per pass", &self.records, 0),
            ("skipped per pass", &self.skipped, 0),
            ("pass duration (s)", &self.pass_duration_seconds, 3),
        ];
        for (label, series, precision) in rows {
            let s = series.summary();
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.p$}", s.last, p = precision),
                format!("{:.p$}", s.mean, p = precision.max(1)),
                format!("{:.p$}", s.max, p = precision),
                format!("{:.p$}", s.min, p = precision),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "number of done passes: {}", self.total_passes()).ok();
        writeln!(out, "number of failed passes: {}", self.failed_passes()).ok();
        writeln!(
            out,
            "skipped (access-denied): {}",
            self.skipped_access_denied.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "skipped (vanished): {}",
            self.skipped_vanished.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(out, "http requests: {}", self.http_requests()).ok();
        writeln!(out, "uptime (s): {}", self.uptime_seconds()).ok();

        out
    }
}
