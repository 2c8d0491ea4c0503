//! Process table backed by the Linux /proc filesystem.
//!
//! The root directory is configurable so a fake tree can stand in for
//! `/proc`. Per process the source reads `stat`, `statm`, `cmdline`,
//! `exe`, `fd/` and `status`; the root `uptime` file supplies the
//! monotonic "now" used for CPU percent.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cpu::CpuClock;
use crate::error::{ReadError, SampleError};
use crate::record::Status;
use crate::source::{CpuReading, ProcessSource, RawProcess};

/// Kernel truncates `comm` to this many bytes.
const COMM_LEN: usize = 15;

/// Clock ticks per second, as reported by `sysconf(_SC_CLK_TCK)`.
pub static CLOCK_TICKS: Lazy<f64> = Lazy::new(|| {
    // SAFETY: sysconf has no preconditions.
    let v = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if v > 0 {
        v as f64
    } else {
        100.0
    }
});

/// Memory page size in bytes, as reported by `sysconf(_SC_PAGESIZE)`.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(|| {
    // SAFETY: sysconf has no preconditions.
    let v = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if v > 0 {
        v as u64
    } else {
        4096
    }
});

/// Fields of interest from `/proc/<pid>/stat`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatFields {
    pub comm: String,
    pub state: char,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub num_threads: u64,
    pub start_ticks: u64,
}

/// Parses `/proc/<pid>/stat`.
///
/// `comm` may itself contain spaces and parentheses, so it is taken as the
/// text between the first `(` and the last `)`.
pub fn parse_stat(pid: u32, content: &str) -> Result<StatFields, ReadError> {
    let malformed = || ReadError::Malformed { pid, what: "stat" };

    let lpar = content.find('(').ok_or_else(malformed)?;
    let rpar = content.rfind(')').ok_or_else(malformed)?;
    if rpar < lpar {
        return Err(malformed());
    }
    let comm = content[lpar + 1..rpar].to_string();

    // Fields after comm start at field 3 (state).
    let rest: Vec<&str> = content[rpar + 1..].split_whitespace().collect();
    if rest.len() < 20 {
        return Err(malformed());
    }

    let state = rest[0].chars().next().ok_or_else(malformed)?;
    let num = |idx: usize| -> Result<u64, ReadError> {
        rest[idx].parse::<u64>().map_err(|_| malformed())
    };

    Ok(StatFields {
        comm,
        state,
        utime_ticks: num(11)?,
        stime_ticks: num(12)?,
        num_threads: num(17)?,
        start_ticks: num(19)?,
    })
}

/// Parses `/proc/<pid>/statm` into `(vms_pages, rss_pages)`.
pub fn parse_statm(pid: u32, content: &str) -> Result<(u64, u64), ReadError> {
    let mut it = content.split_whitespace();
    let mut next = || -> Result<u64, ReadError> {
        it.next()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or(ReadError::Malformed { pid, what: "statm" })
    };
    let size = next()?;
    let resident = next()?;
    Ok((size, resident))
}

/// Splits raw `/proc/<pid>/cmdline` bytes into arguments.
///
/// Arguments are NUL-separated. Some programs rewrite their argv as one
/// space-separated string; that case is split on spaces instead.
pub fn parse_cmdline(data: &[u8]) -> Vec<String> {
    if data.is_empty() {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(data).into_owned();
    let sep = if text.ends_with('\0') { '\0' } else { ' ' };
    let trimmed = text.strip_suffix(sep).unwrap_or(text.as_str());

    let parts: Vec<String> = trimmed.split(sep).map(str::to_string).collect();
    if sep == '\0' && parts.len() == 1 && trimmed.contains(' ') {
        return trimmed.split(' ').map(str::to_string).collect();
    }
    parts
}

/// Extracts the real uid from the `Uid:` line of `/proc/<pid>/status`.
pub fn parse_status_uid(pid: u32, content: &str) -> Result<u32, ReadError> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|v| v.split_whitespace().next())
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or(ReadError::Malformed { pid, what: "status" })
}

/// Parses the first value of `/proc/uptime` (seconds since boot).
pub fn parse_uptime(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Picks the display name: `comm`, unless it looks truncated and the first
/// command-line argument's basename extends it.
pub fn process_name(comm: &str, args: &[String]) -> String {
    if comm.len() >= COMM_LEN {
        if let Some(first) = args.first() {
            if let Some(base) = Path::new(first).file_name().and_then(|s| s.to_str()) {
                if base.starts_with(comm) {
                    return base.to_string();
                }
            }
        }
    }
    comm.to_string()
}

/// Suffix the kernel appends to `exe` when the binary was unlinked.
const DELETED_SUFFIX: &str = " (deleted)";

/// Drops the ` (deleted)` marker from an `exe` link target, unless a file
/// with that literal name exists.
pub fn strip_deleted_suffix(target: String) -> String {
    if let Some(path) = target.strip_suffix(DELETED_SUFFIX) {
        if !Path::new(&target).exists() {
            return path.to_string();
        }
    }
    target
}

/// uid to user name lookup, loaded from a passwd-format file.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    by_uid: HashMap<u32, String>,
}

impl UserTable {
    pub fn parse(content: &str) -> Self {
        let mut by_uid = HashMap::new();
        for line in content.lines() {
            if line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(':');
            let (Some(name), Some(_pw), Some(uid)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if let Ok(uid) = uid.parse::<u32>() {
                // first entry wins, like getpwuid
                by_uid.entry(uid).or_insert_with(|| name.to_string());
            }
        }
        Self { by_uid }
    }

    /// Loads the table from `path`. A missing or unreadable file yields an
    /// empty table, so every user is reported by numeric uid.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let table = Self::parse(&content);
                debug!("Loaded {} users from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!("Failed to read user database {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Name for `uid`, or the decimal uid if it has no entry.
    pub fn name(&self, uid: u32) -> String {
        self.by_uid
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

/// Process table read from a procfs mount.
pub struct ProcFsSource {
    root: PathBuf,
    users: UserTable,
    clock_ticks: f64,
    page_size: u64,
    /// Seconds since boot, read once per enumeration.
    now_seconds: f64,
}

impl ProcFsSource {
    /// Creates a source rooted at `root`, resolving users from `passwd`.
    pub fn new(root: impl Into<PathBuf>, passwd: &Path) -> Self {
        Self::with_units(root, UserTable::load(passwd), *CLOCK_TICKS, *PAGE_SIZE)
    }

    /// Creates a source with explicit clock tick rate and page size.
    pub fn with_units(
        root: impl Into<PathBuf>,
        users: UserTable,
        clock_ticks: f64,
        page_size: u64,
    ) -> Self {
        Self {
            root: root.into(),
            users,
            clock_ticks,
            page_size,
            now_seconds: 0.0,
        }
    }

    fn read_uptime(&self) -> io::Result<f64> {
        let content = fs::read_to_string(self.root.join("uptime"))?;
        parse_uptime(&content).ok_or_else(|| io::Error::other("invalid uptime format"))
    }

    /// Resolves the `exe` link. A missing link on a still-present process
    /// (kernel threads, zombies) is reported as an empty path.
    fn read_exe(&self, pid: u32, proc_path: &Path) -> Result<String, ReadError> {
        match fs::read_link(proc_path.join("exe")) {
            Ok(target) => Ok(strip_deleted_suffix(
                target.to_string_lossy().into_owned(),
            )),
            Err(e) => match ReadError::from_io(pid, e) {
                ReadError::Vanished if proc_path.exists() => Ok(String::new()),
                other => Err(other),
            },
        }
    }

    fn count_fds(&self, pid: u32, proc_path: &Path) -> Result<u64, ReadError> {
        let entries =
            fs::read_dir(proc_path.join("fd")).map_err(|e| ReadError::from_io(pid, e))?;
        Ok(entries.flatten().count() as u64)
    }
}

fn read_text(pid: u32, path: &Path) -> Result<String, ReadError> {
    fs::read_to_string(path).map_err(|e| ReadError::from_io(pid, e))
}

impl ProcessSource for ProcFsSource {
    fn pids(&mut self) -> Result<Vec<u32>, SampleError> {
        self.now_seconds = self.read_uptime().map_err(SampleError::Enumerate)?;

        let mut pids: Vec<u32> = fs::read_dir(&self.root)
            .map_err(SampleError::Enumerate)?
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                if !name.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                name.parse::<u32>().ok()
            })
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn read(&mut self, pid: u32) -> Result<RawProcess, ReadError> {
        let proc_path = self.root.join(pid.to_string());

        let stat = parse_stat(pid, &read_text(pid, &proc_path.join("stat"))?)?;
        let (vms_pages, rss_pages) = parse_statm(pid, &read_text(pid, &proc_path.join("statm"))?)?;

        let raw_cmdline =
            fs::read(proc_path.join("cmdline")).map_err(|e| ReadError::from_io(pid, e))?;
        let args = parse_cmdline(&raw_cmdline);

        let exe = self.read_exe(pid, &proc_path)?;
        let num_fds = self.count_fds(pid, &proc_path)?;
        let uid = parse_status_uid(pid, &read_text(pid, &proc_path.join("status"))?)?;

        let cpu_time_user = stat.utime_ticks as f64 / self.clock_ticks;
        let cpu_time_system = stat.stime_ticks as f64 / self.clock_ticks;

        Ok(RawProcess {
            pid,
            name: process_name(&stat.comm, &args),
            exe,
            cmdline: args.join(" "),
            username: self.users.name(uid),
            num_fds,
            num_threads: stat.num_threads,
            cpu_time_user,
            cpu_time_system,
            rss: rss_pages * self.page_size,
            vms: vms_pages * self.page_size,
            status: Status::from_proc_state(stat.state),
            cpu: CpuReading::Clock(CpuClock {
                cpu_seconds: cpu_time_user + cpu_time_system,
                start_seconds: stat.start_ticks as f64 / self.clock_ticks,
                now_seconds: self.now_seconds,
            }),
        })
    }
}
