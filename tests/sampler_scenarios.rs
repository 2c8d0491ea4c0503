//! End-to-end sampling passes over synthetic process tables.

use ajaxtop::fixture::{FixtureFailure, FixtureSource, TestData, TestProcess};
use ajaxtop::record::Status;
use ajaxtop::sampler::Sampler;
use ajaxtop::SampleError;

fn process(pid: u32, name: &str, series: &[f64], fail: Option<FixtureFailure>) -> TestProcess {
    TestProcess {
        pid,
        name: name.to_string(),
        exe: format!("/usr/bin/{name}"),
        cmdline: format!("/usr/bin/{name} --serve"),
        username: "root".to_string(),
        num_fds: 8,
        num_threads: 2,
        cpu_time_user: 12.5,
        cpu_time_system: 3.25,
        rss: 4096 * 300,
        vms: 4096 * 2500,
        status: "sleeping".to_string(),
        cpu_percent: series.to_vec(),
        fail,
    }
}

fn data(processes: Vec<TestProcess>) -> TestData {
    TestData {
        version: "1.0".to_string(),
        generated_at: "2026-01-01T00:00:00Z".to_string(),
        processes,
    }
}

#[test]
fn skips_denied_and_vanished_processes() {
    let mut sampler = Sampler::new(FixtureSource::new(data(vec![
        process(1, "init", &[12.0], None),
        process(2, "secret", &[5.0], Some(FixtureFailure::AccessDenied)),
        process(3, "gone", &[5.0], Some(FixtureFailure::Vanished)),
    ])));

    let records = sampler.sample().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pid, 1);
    assert_eq!(records[0].name, "init");
    assert_eq!(records[0].cpu_percent, 12.0);
    assert_eq!(records[0].cpu_percent_slow, 12.0);
}

#[test]
fn smoothing_halves_toward_new_readings() {
    let mut sampler = Sampler::new(FixtureSource::new(data(vec![process(
        7,
        "worker",
        &[10.0, 30.0, 30.0],
        None,
    )])));

    let slow: Vec<f64> = (0..3)
        .map(|_| sampler.sample().unwrap()[0].cpu_percent_slow)
        .collect();
    assert_eq!(slow, vec![10.0, 20.0, 25.0]);
}

#[test]
fn empty_table_yields_no_records() {
    let mut sampler = Sampler::new(FixtureSource::new(data(Vec::new())));
    let (records, report) = sampler.sample_with_report().unwrap();
    assert!(records.is_empty());
    assert_eq!(report.enumerated, 0);
    assert_eq!(report.skipped(), 0);
}

#[test]
fn malformed_process_aborts_the_pass() {
    let mut sampler = Sampler::new(FixtureSource::new(data(vec![
        process(1, "init", &[1.0], None),
        process(9, "broken", &[1.0], Some(FixtureFailure::Malformed)),
    ])));

    match sampler.sample() {
        Err(SampleError::Read { pid, .. }) => assert_eq!(pid, 9),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn cache_only_holds_pids_of_the_latest_pass() {
    let mut sampler = Sampler::new(FixtureSource::new(data(
        (100..110).map(|pid| process(pid, "churn", &[1.0], None)).collect(),
    )));
    sampler.sample().unwrap();
    assert_eq!(sampler.smoothing().len(), 10);

    *sampler.source_mut() = FixtureSource::new(data(vec![process(200, "fresh", &[4.0], None)]));
    let (records, report) = sampler.sample_with_report().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(report.evicted, 10);
    assert_eq!(sampler.smoothing().len(), 1);
    assert_eq!(sampler.smoothing().get(200), Some(4.0));
}

#[test]
fn unknown_status_names_map_to_unknown() {
    let mut odd = process(5, "odd", &[0.0], None);
    odd.status = "parked".to_string();
    let mut sampler = Sampler::new(FixtureSource::new(data(vec![
        odd,
        process(6, "normal", &[0.0], None),
    ])));

    let records = sampler.sample().unwrap();
    assert_eq!(records[0].status, Status::Unknown);
    assert_eq!(records[1].status, Status::Sleeping);
}
