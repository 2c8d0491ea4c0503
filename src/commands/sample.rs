//! Sample command implementation.
//!
//! Runs sampling passes outside the server and prints the last snapshot,
//! either as the `/data` body or as a short summary.

use std::thread;
use std::time::Duration;

use ajaxtop::handlers::data::render_records;
use ajaxtop::record::ProcessRecord;
use ajaxtop::sampler::{DynSampler, SampleReport};
use ajaxtop::source::ProcessSource;

/// Number of top CPU consumers listed by `--summary`.
const SUMMARY_TOP: usize = 10;

pub fn command_sample(
    source: Box<dyn ProcessSource>,
    iterations: usize,
    interval_ms: u64,
    summary: bool,
) -> anyhow::Result<()> {
    let mut sampler = DynSampler::new(source);
    let iterations = iterations.max(1);

    let mut last = None;
    for i in 0..iterations {
        if i > 0 {
            thread::sleep(Duration::from_millis(interval_ms));
        }
        let pass = sampler.sample_with_report()?;
        if summary {
            print_report(i + 1, iterations, &pass.1);
        }
        last = Some(pass);
    }

    let Some((records, _)) = last else {
        return Ok(());
    };

    if summary {
        print_top(&records);
    } else {
        println!("{}", render_records(&records)?);
    }
    Ok(())
}

fn print_report(iteration: usize, iterations: usize, report: &SampleReport) {
    println!("\n🔄 Pass {}/{}:", iteration, iterations);
    println!("   📁 Enumerated: {}", report.enumerated);
    println!("   📊 Records: {}", report.records);
    println!(
        "   ⚠️  Skipped: {} access-denied, {} vanished",
        report.skipped_access_denied, report.skipped_vanished
    );
    println!(
        "   ⏱️  Duration: {:.2}ms",
        report.duration_seconds * 1000.0
    );
}

fn print_top(records: &[ProcessRecord]) {
    let mut top: Vec<&ProcessRecord> = records.iter().collect();
    top.sort_by(|a, b| {
        b.cpu_percent_slow
            .total_cmp(&a.cpu_percent_slow)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.pid.cmp(&b.pid))
    });

    println!("\n📈 Top {} by smoothed CPU:", SUMMARY_TOP.min(top.len()));
    println!(
        "   {:>7} {:>8} {:>8} {:<10} {}",
        "PID", "%CPU", "%CPU(1)", "STATUS", "NAME"
    );
    for r in top.into_iter().take(SUMMARY_TOP) {
        println!(
            "   {:>7} {:>8.2} {:>8.2} {:<10} {}",
            r.pid,
            r.cpu_percent_slow,
            r.cpu_percent,
            r.status.as_str(),
            r.name
        );
    }
}
