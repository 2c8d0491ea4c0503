//! Check command implementation.

use std::time::Instant;

use ajaxtop::config::{validate_effective_config, Config};
use ajaxtop::procfs::ProcFsSource;
use ajaxtop::sampler::SkipReason;
use ajaxtop::source::ProcessSource;

/// Verifies that the configured proc root is readable and reports how many
/// processes could be read and why the others were skipped.
pub fn command_check(config: &Config) -> anyhow::Result<()> {
    println!("🔍 ajaxtop - System Check");
    println!("=========================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    let root = config.proc_root();
    println!("\n📁 Checking {}...", root.display());
    if !root.exists() {
        println!("   ❌ {} not found", root.display());
        all_ok = false;
    } else {
        let mut source = ProcFsSource::new(root, config.passwd_file());
        let start = Instant::now();
        match source.pids() {
            Ok(pids) => {
                println!("   ✅ Enumerated {} processes", pids.len());

                let (mut readable, mut denied, mut vanished, mut failed) = (0, 0, 0, 0);
                for pid in pids {
                    match source.read(pid) {
                        Ok(_) => readable += 1,
                        Err(e) => match e.skip_reason() {
                            Some(SkipReason::AccessDenied) => denied += 1,
                            Some(SkipReason::Vanished) => vanished += 1,
                            None => {
                                println!("   ❌ {}", e);
                                failed += 1;
                            }
                        },
                    }
                }

                println!("   ✅ Readable: {}", readable);
                println!("   ⚠️  Skipped (access-denied): {}", denied);
                println!("   ⚠️  Skipped (vanished): {}", vanished);
                println!(
                    "   ⏱️  Pass duration: {:.2}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                if failed > 0 {
                    println!("   ❌ Unreadable: {}", failed);
                    all_ok = false;
                }
                if readable == 0 {
                    println!("   ❌ No readable processes");
                    all_ok = false;
                }
            }
            Err(e) => {
                println!("   ❌ Cannot enumerate processes: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
