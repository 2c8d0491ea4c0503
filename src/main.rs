//! ajaxtop binary: HTTP server plus maintenance subcommands.

use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, level_filters::LevelFilter, warn};

use ajaxtop::config::{load_config, validate_effective_config, Config};
use ajaxtop::fixture::FixtureSource;
use ajaxtop::handlers;
use ajaxtop::procfs::ProcFsSource;
use ajaxtop::source::ProcessSource;
use ajaxtop::state::AppState;

mod cli;
mod commands;

use cli::{Args, Commands, ConfigFormat, LogLevel};

/// Merges config sources. Precedence: CLI > config file > defaults.
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{level:?}").to_lowercase());
    }
    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

/// Shows configuration in requested format
fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    let output = commands::config::render_config(config, format)?;
    println!("{output}");
    Ok(())
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let level = config
        .log_level
        .as_deref()
        .and_then(LogLevel::from_name)
        .unwrap_or(LogLevel::Info);

    let max_level = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// Picks the fixture file when one is given, the proc filesystem otherwise.
fn build_source(args: &Args, config: &Config) -> anyhow::Result<Box<dyn ProcessSource>> {
    if let Some(path) = &args.test_data_file {
        let source = FixtureSource::from_file(path).map_err(anyhow::Error::msg)?;
        warn!("Serving synthetic processes from {}", path.display());
        return Ok(Box::new(source));
    }

    let root = config.proc_root();
    if !root.exists() {
        anyhow::bail!("proc root {} does not exist", root.display());
    }
    debug!("Reading processes from {}", root.display());
    Ok(Box::new(ProcFsSource::new(root, config.passwd_file())))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    let config = resolve_config(&args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&config)?;

    if let Some(command) = &args.command {
        return match command {
            Commands::Check => commands::command_check(&config),
            Commands::Config {
                output,
                format,
                commented,
            } => commands::command_config(output.clone(), *format, *commented),
            Commands::Sample {
                iterations,
                interval_ms,
                summary,
            } => {
                let source = build_source(&args, &config)?;
                commands::command_sample(source, *iterations, *interval_ms, *summary)
            }
            Commands::GenerateTestdata {
                output,
                count,
                samples,
                failure_every,
            } => commands::command_generate_testdata(
                output.clone(),
                *count,
                *samples,
                *failure_every,
            ),
        };
    }

    info!("Starting ajaxtop");

    let source = build_source(&args, &config)?;
    let ip: IpAddr = config.bind().parse().context("Invalid bind address")?;
    let addr = SocketAddr::new(ip, config.port());

    let state = AppState::new(source, config);
    let app = handlers::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("ajaxtop listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("ajaxtop stopped gracefully");
    Ok(())
}
