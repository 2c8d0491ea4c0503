//! ProcFsSource against a fake proc tree built in a temp directory.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use ajaxtop::error::ReadError;
use ajaxtop::procfs::{ProcFsSource, UserTable};
use ajaxtop::record::Status;
use ajaxtop::sampler::Sampler;
use ajaxtop::source::{CpuReading, ProcessSource};

const CLOCK_TICKS: f64 = 100.0;
const PAGE_SIZE: u64 = 4096;

fn stat_line(pid: u32, comm: &str, state: char, utime: u64, stime: u64, threads: u64) -> String {
    format!(
        "{pid} ({comm}) {state} 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 0 {threads} 0 0 10000000 500 0\n"
    )
}

struct FakeProc<'a> {
    pid: u32,
    comm: &'a str,
    state: char,
    utime: u64,
    stime: u64,
    cmdline: &'a [u8],
    exe: Option<&'a str>,
    uid: u32,
    fds: usize,
}

fn write_process(root: &Path, p: &FakeProc) {
    let dir = root.join(p.pid.to_string());
    fs::create_dir_all(dir.join("fd")).unwrap();
    fs::write(dir.join("stat"), stat_line(p.pid, p.comm, p.state, p.utime, p.stime, 3)).unwrap();
    fs::write(dir.join("statm"), "2500 300 120 10 0 900 0\n").unwrap();
    fs::write(dir.join("cmdline"), p.cmdline).unwrap();
    fs::write(
        dir.join("status"),
        format!("Name:\t{}\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\n", p.comm, uid = p.uid),
    )
    .unwrap();
    for fd in 0..p.fds {
        fs::write(dir.join("fd").join(fd.to_string()), "").unwrap();
    }
    if let Some(exe) = p.exe {
        symlink(exe, dir.join("exe")).unwrap();
    }
}

fn source(root: &Path) -> ProcFsSource {
    let users = UserTable::parse(
        "root:x:0:0::/root:/bin/sh\nalice:x:1000:1000::/home/alice:/bin/sh\n",
    );
    ProcFsSource::with_units(root, users, CLOCK_TICKS, PAGE_SIZE)
}

fn python(pid: u32, utime: u64) -> FakeProc<'static> {
    FakeProc {
        pid,
        comm: "python3",
        state: 'R',
        utime,
        stime: 100,
        cmdline: b"/usr/bin/python3\0-m\0http.server\0",
        exe: Some("/usr/bin/python3.12"),
        uid: 1000,
        fds: 3,
    }
}

#[test]
fn reads_all_fields_of_a_process() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    fs::create_dir(dir.path().join("self")).unwrap();
    write_process(dir.path(), &python(42, 300));

    let mut src = source(dir.path());
    assert_eq!(src.pids().unwrap(), vec![42]);

    let raw = src.read(42).unwrap();
    assert_eq!(raw.pid, 42);
    assert_eq!(raw.name, "python3");
    assert_eq!(raw.exe, "/usr/bin/python3.12");
    assert_eq!(raw.cmdline, "/usr/bin/python3 -m http.server");
    assert_eq!(raw.username, "alice");
    assert_eq!(raw.num_fds, 3);
    assert_eq!(raw.num_threads, 3);
    assert_eq!(raw.cpu_time_user, 3.0);
    assert_eq!(raw.cpu_time_system, 1.0);
    assert_eq!(raw.rss, 300 * PAGE_SIZE);
    assert_eq!(raw.vms, 2500 * PAGE_SIZE);
    assert_eq!(raw.status, Status::Running);
    match raw.cpu {
        CpuReading::Clock(clock) => {
            assert_eq!(clock.cpu_seconds, 4.0);
            assert_eq!(clock.start_seconds, 0.0);
            assert_eq!(clock.now_seconds, 8.0);
        }
        other => panic!("unexpected cpu reading {other:?}"),
    }
}

#[test]
fn kernel_thread_without_exe_reads_empty_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    write_process(
        dir.path(),
        &FakeProc {
            pid: 2,
            comm: "kthreadd",
            state: 'S',
            utime: 0,
            stime: 0,
            cmdline: b"",
            exe: None,
            uid: 0,
            fds: 0,
        },
    );

    let mut src = source(dir.path());
    src.pids().unwrap();
    let raw = src.read(2).unwrap();
    assert_eq!(raw.exe, "");
    assert_eq!(raw.cmdline, "");
    assert_eq!(raw.username, "root");
    assert_eq!(raw.status, Status::Sleeping);
}

#[test]
fn replaced_binary_reports_path_without_deleted_marker() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    let mut server = python(50, 300);
    server.exe = Some("/nonexistent/opt/server (deleted)");
    write_process(dir.path(), &server);

    let mut src = source(dir.path());
    src.pids().unwrap();
    assert_eq!(src.read(50).unwrap().exe, "/nonexistent/opt/server");
}

#[test]
fn process_gone_after_enumeration_is_vanished() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    write_process(dir.path(), &python(42, 300));
    write_process(dir.path(), &python(43, 300));

    let mut src = source(dir.path());
    assert_eq!(src.pids().unwrap(), vec![42, 43]);
    fs::remove_dir_all(dir.path().join("43")).unwrap();

    assert!(src.read(42).is_ok());
    assert!(matches!(src.read(43), Err(ReadError::Vanished)));
}

#[test]
fn corrupt_stat_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    write_process(dir.path(), &python(42, 300));
    fs::write(dir.path().join("42").join("stat"), "42 (python3) R\n").unwrap();

    let mut src = source(dir.path());
    src.pids().unwrap();
    assert!(matches!(
        src.read(42),
        Err(ReadError::Malformed { pid: 42, what: "stat" })
    ));
}

#[test]
fn missing_uptime_fails_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    write_process(dir.path(), &python(42, 300));
    assert!(source(dir.path()).pids().is_err());
}

#[test]
fn sampler_derives_and_smooths_cpu_from_clock_deltas() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("uptime"), "8.00 1.00\n").unwrap();
    write_process(dir.path(), &python(42, 300));

    let mut sampler = Sampler::new(source(dir.path()));

    // 4 CPU seconds over 8 seconds of life.
    let first = sampler.sample().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].cpu_percent, 50.0);
    assert_eq!(first[0].cpu_percent_slow, 50.0);

    // 2 more CPU seconds over 2 wall seconds.
    fs::write(dir.path().join("uptime"), "10.00 1.00\n").unwrap();
    fs::write(
        dir.path().join("42").join("stat"),
        stat_line(42, "python3", 'R', 500, 100, 3),
    )
    .unwrap();
    let second = sampler.sample().unwrap();
    assert_eq!(second[0].cpu_percent, 100.0);
    assert_eq!(second[0].cpu_percent_slow, 75.0);
}
