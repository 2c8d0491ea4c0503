//! Synthetic process table loaded from a JSON test data file.
//!
//! Used by `--test-data-file` to serve fake processes instead of /proc, and
//! produced by the `generate-testdata` subcommand.

use ahash::AHashMap as HashMap;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ReadError, SampleError};
use crate::record::Status;
use crate::source::{CpuReading, ProcessSource, RawProcess};

/// Failure a synthetic process raises when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixtureFailure {
    AccessDenied,
    Vanished,
    Malformed,
}

/// Test process entry for JSON serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestProcess {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub exe: String,
    #[serde(default)]
    pub cmdline: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub num_fds: u64,
    #[serde(default)]
    pub num_threads: u64,
    #[serde(default)]
    pub cpu_time_user: f64,
    #[serde(default)]
    pub cpu_time_system: f64,
    #[serde(default)]
    pub rss: u64,
    #[serde(default)]
    pub vms: u64,
    /// Status name; unrecognized names are reported as `unknown`.
    pub status: String,
    /// CPU percent per sample; the last value repeats once exhausted.
    #[serde(default)]
    pub cpu_percent: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<FixtureFailure>,
}

/// Root structure for test data JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestData {
    pub version: String,
    pub generated_at: String,
    pub processes: Vec<TestProcess>,
}

/// Load test data from JSON file.
pub fn load_test_data_from_file(path: &Path) -> Result<TestData, String> {
    debug!("Loading test data from: {}", path.display());

    if !path.exists() {
        return Err(format!("Test data file not found: {}", path.display()));
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read test data file: {}", e))?;
    let test_data: TestData = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse test data JSON: {}", e))?;

    info!(
        "Loaded test data version {} from {}",
        test_data.version, test_data.generated_at
    );

    Ok(test_data)
}

/// Process source serving [`TestData`].
pub struct FixtureSource {
    processes: Vec<TestProcess>,
    reads: HashMap<u32, usize>,
}

impl FixtureSource {
    pub fn new(data: TestData) -> Self {
        Self {
            processes: data.processes,
            reads: HashMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        load_test_data_from_file(path).map(Self::new)
    }

    /// Next CPU percent in the series of `process`.
    fn next_percent(&mut self, idx: usize) -> f64 {
        let process = &self.processes[idx];
        let count = self.reads.entry(process.pid).or_insert(0);
        let value = match process.cpu_percent.len() {
            0 => 0.0,
            n => process.cpu_percent[(*count).min(n - 1)],
        };
        *count += 1;
        value
    }
}

impl ProcessSource for FixtureSource {
    fn pids(&mut self) -> Result<Vec<u32>, SampleError> {
        Ok(self.processes.iter().map(|p| p.pid).collect())
    }

    fn read(&mut self, pid: u32) -> Result<RawProcess, ReadError> {
        let idx = self
            .processes
            .iter()
            .position(|p| p.pid == pid)
            .ok_or(ReadError::Vanished)?;

        match self.processes[idx].fail {
            Some(FixtureFailure::AccessDenied) => return Err(ReadError::AccessDenied),
            Some(FixtureFailure::Vanished) => return Err(ReadError::Vanished),
            Some(FixtureFailure::Malformed) => {
                return Err(ReadError::Malformed {
                    pid,
                    what: "fixture",
                })
            }
            None => {}
        }

        let percent = self.next_percent(idx);
        let p = &self.processes[idx];
        Ok(RawProcess {
            pid: p.pid,
            name: p.name.clone(),
            exe: p.exe.clone(),
            cmdline: p.cmdline.clone(),
            username: p.username.clone(),
            num_fds: p.num_fds,
            num_threads: p.num_threads,
            cpu_time_user: p.cpu_time_user,
            cpu_time_system: p.cpu_time_system,
            rss: p.rss,
            vms: p.vms,
            status: Status::from_name(&p.status),
            cpu: CpuReading::Percent(percent),
        })
    }
}

const NAMES: &[(&str, &str)] = &[
    ("systemd", "/usr/lib/systemd/systemd"),
    ("sshd", "/usr/sbin/sshd"),
    ("nginx", "/usr/sbin/nginx"),
    ("postgres", "/usr/lib/postgresql/16/bin/postgres"),
    ("python3", "/usr/bin/python3.12"),
    ("bash", "/usr/bin/bash"),
    ("firefox", "/usr/lib/firefox/firefox"),
    ("cron", "/usr/sbin/cron"),
];

const USERS: &[&str] = &["root", "www-data", "postgres", "alice"];

const STATUSES: &[&str] = &["running", "sleeping", "sleeping", "sleeping", "idle", "disk-sleep"];

/// Builds `count` random processes starting at pid 1000. Every
/// `failure_every`-th process (if nonzero) raises access-denied or vanished
/// alternately.
pub fn generate_test_data(
    rng: &mut impl Rng,
    count: usize,
    samples: usize,
    failure_every: usize,
) -> TestData {
    let mut processes = Vec::with_capacity(count);
    for i in 0..count {
        let pid = 1000 + i as u32;
        let fail = if failure_every > 0 && (i + 1) % failure_every == 0 {
            if (i / failure_every) % 2 == 0 {
                Some(FixtureFailure::AccessDenied)
            } else {
                Some(FixtureFailure::Vanished)
            }
        } else {
            None
        };
        processes.push(generate_random_process(rng, pid, samples, fail));
    }

    TestData {
        version: "1.0".to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        processes,
    }
}

/// Generates a random test process with realistic memory and CPU values.
fn generate_random_process(
    rng: &mut impl Rng,
    pid: u32,
    samples: usize,
    fail: Option<FixtureFailure>,
) -> TestProcess {
    let (name, exe) = NAMES[rng.gen_range(0..NAMES.len())];

    // RSS: 1 MB - 2 GB, VMS: 2-8x RSS
    let rss = rng.gen_range(1024 * 1024..2 * 1024 * 1024 * 1024_u64);
    let vms = rss * rng.gen_range(2..8_u64);

    let cpu_percent: Vec<f64> = (0..samples.max(1))
        .map(|_| {
            if rng.gen_bool(0.6) {
                0.0
            } else {
                (rng.gen_range(0.0..120.0_f64) * 10.0).round() / 10.0
            }
        })
        .collect();

    TestProcess {
        pid,
        name: name.to_string(),
        exe: exe.to_string(),
        cmdline: format!("{} --worker {}", exe, pid),
        username: USERS[rng.gen_range(0..USERS.len())].to_string(),
        num_fds: rng.gen_range(3..512),
        num_threads: rng.gen_range(1..64),
        cpu_time_user: rng.gen_range(0.0..10000.0),
        cpu_time_system: rng.gen_range(0.0..2000.0),
        rss,
        vms,
        status: STATUSES[rng.gen_range(0..STATUSES.len())].to_string(),
        cpu_percent,
        fail,
    }
}
