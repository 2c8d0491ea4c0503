//! Generate testdata command implementation.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use ajaxtop::fixture::generate_test_data;

/// Writes a synthetic fixture file usable with `--test-data-file`.
pub fn command_generate_testdata(
    output: PathBuf,
    count: usize,
    samples: usize,
    failure_every: usize,
) -> anyhow::Result<()> {
    debug!(
        "Generating test data: count={}, samples={}, failure_every={}, output={}",
        count,
        samples,
        failure_every,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let test_data = generate_test_data(&mut rng, count, samples, failure_every);

    let json_content = serde_json::to_string_pretty(&test_data)?;
    fs::write(&output, &json_content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✅ Generated test data: {} processes in {}",
        test_data.processes.len(),
        output.display()
    );

    Ok(())
}
