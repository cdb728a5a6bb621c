use anyhow::{Context, Result};
use clap::Parser;
use gamewatch::{
    Config, ConfigWatcher, JsonBindingExporter, LiveSettings, ProcMemAttacher, ProcessLocator,
    SharedBindings, Supervisor,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gamewatch")]
#[command(about = "Watch for the game client, attach the memory reader and export bindings", long_about = None)]
struct Args {
    /// Config file (default: search the usual locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override memory_reading_enabled from the config; disables hot reload of the flag
    #[arg(short, long)]
    memory_reading: Option<bool>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Run a single tick, print the resulting state as JSON and exit
    #[arg(long)]
    once: bool,
}

fn init_logging(args: &Args) -> Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let (config, config_path) = match &args.config {
        Some(path) => {
            let config = Config::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => Config::load(),
    };

    let settings = LiveSettings::from_config(&config);
    if let Some(enabled) = args.memory_reading {
        settings.set_memory_reading_enabled(enabled);
    }

    let bindings: SharedBindings = Arc::new(RwLock::new(config.bindings.clone()));

    // Keeps the flag live while the watcher is alive
    let _watcher = match (&config_path, args.memory_reading, args.once) {
        (Some(path), None, false) => {
            match ConfigWatcher::spawn(path, settings.clone(), Some(bindings.clone())) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    None
                }
            }
        }
        _ => None,
    };

    let exporter = JsonBindingExporter::new(bindings, config.export_path());
    let mut supervisor = Supervisor::new(
        ProcessLocator::system(),
        Box::new(ProcMemAttacher::new()),
        Box::new(exporter),
        Arc::new(settings),
    );

    if args.once {
        let report = supervisor.tick();
        for failure in &report.failures {
            tracing::warn!(error = %failure, "Tick failure");
        }
        let snapshot = supervisor.snapshot();
        supervisor.shutdown();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let handle = supervisor.spawn();
    let mut status = handle.status();
    let mut last = status.borrow_and_update().clone();
    println!("{}", last.summary());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = status.borrow_and_update().clone();
                if !snapshot.same_state(&last) {
                    println!("{}", snapshot.summary());
                    last = snapshot;
                }
            }
        }
    }

    let last = handle
        .shutdown()
        .await
        .context("Supervisor task failed")?;
    println!("{}", last.summary());

    Ok(())
}
