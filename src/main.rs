mod core;
mod models;
mod system;
mod ui;
mod utils;

use anyhow::Context;
use clap::Parser;
use crate::core::{CancellationToken, ExtractionEngine};
use models::config::{default_log_path, InstallerConfig, UiKind};
use models::plan::{public_name_of, FilterMode};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing_subscriber::EnvFilter;
use ui::{PlainReporter, ProgressReporter, TerminalReporter};
use utils::error::{InstallerError, Result};

/// Bundle installer - extracts a bundled archive with all-or-nothing rollback
#[derive(Parser, Debug)]
#[command(name = "bundle-installer")]
#[command(version)]
#[command(about = "Extracts a bundled archive into a destination directory")]
struct Args {
    /// Config file (default: <config dir>/bundle-installer/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Archive to install from
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Directory the installation folder is created in (default: Desktop)
    #[arg(short, long = "dir")]
    extraction_dir: Option<PathBuf>,

    /// Installation folder name; a leading '.' hides it until installation finishes
    #[arg(short = 'n', long = "name")]
    extraction_name: Option<String>,

    /// Folder inside the installation folder that receives archive entries
    #[arg(long)]
    source_folder: Option<String>,

    /// How entries are selected
    #[arg(long, value_enum)]
    filter: Option<FilterMode>,

    /// Entry name prefix used by the filter
    #[arg(long)]
    prefix: Option<String>,

    /// Progress display
    #[arg(long, value_enum)]
    ui: Option<UiKind>,

    /// Start without asking for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl Args {
    fn apply(self, config: &mut InstallerConfig) {
        if let Some(archive) = self.archive {
            config.archive = archive;
        }
        if let Some(dir) = self.extraction_dir {
            config.extraction_dir = Some(dir);
        }
        if let Some(name) = self.extraction_name {
            config.extraction_name = name;
        }
        if let Some(folder) = self.source_folder {
            config.source_folder = folder;
        }
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
        if let Some(prefix) = self.prefix {
            config.filter_prefix = prefix;
        }
        if let Some(ui) = self.ui {
            config.ui = ui;
        }
        if self.yes {
            config.assume_yes = true;
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args.config.clone();

    let mut config = match InstallerConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::from(2);
        }
    };
    args.apply(&mut config);

    if let Err(e) = init_tracing(config.ui) {
        eprintln!("Failed to set up logging: {:#}", e);
    }
    tracing::info!("Starting bundle-installer v{}", env!("CARGO_PKG_VERSION"));

    let Some(extraction_dir) = config.resolved_extraction_dir() else {
        return quit(&InstallerError::Config(
            "no extraction directory configured and no desktop or home directory found"
                .to_string(),
        ));
    };
    let destination = extraction_dir.join(public_name_of(&config.extraction_name));

    let cancel = CancellationToken::new();
    spawn_signal_watcher(cancel.clone());

    match config.ui {
        UiKind::Plain => {
            let reporter = Arc::new(PlainReporter::new(destination, config.assume_yes));
            let mut engine = build_engine(&config, extraction_dir, reporter, cancel);
            match engine.install(config.filter, &config.filter_prefix) {
                Ok(()) => finish(&engine, &config),
                Err(e) => quit(&e),
            }
        }
        UiKind::Terminal => {
            let reporter = Arc::new(TerminalReporter::new(destination, cancel.clone()));
            if let Err(e) = reporter.open().context("failed to set up terminal") {
                eprintln!("{:#}", e);
                return ExitCode::FAILURE;
            }
            let mut engine =
                build_engine(&config, extraction_dir, reporter.clone(), cancel);
            let result = engine.install(config.filter, &config.filter_prefix);
            reporter.wait_for_dismiss();
            match result {
                Ok(()) => finish(&engine, &config),
                Err(e) => quit(&e),
            }
        }
    }
}

fn build_engine(
    config: &InstallerConfig,
    extraction_dir: PathBuf,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
) -> ExtractionEngine {
    let mut engine = ExtractionEngine::new(&config.archive, reporter, cancel);
    engine.set_extraction_dir(extraction_dir);
    engine.set_extraction_name(&config.extraction_name);
    engine.set_source_folder(&config.source_folder);
    engine.set_temp_archive_name(&config.temp_archive_name);
    engine.set_abort_timeout(config.abort_timeout());
    engine
}

fn finish(engine: &ExtractionEngine, config: &InstallerConfig) -> ExitCode {
    if !engine.finish() {
        eprintln!(
            "Did not finish installation cleanly.\nCheck directory for {}",
            config.temp_archive_name
        );
    }
    ExitCode::SUCCESS
}

/// 설치 오류를 사용자에게 알리고 종료 코드 결정
fn quit(error: &InstallerError) -> ExitCode {
    if error.is_silent() {
        tracing::info!("installation declined");
        return ExitCode::SUCCESS;
    }

    match error {
        InstallerError::Cancelled => {
            println!("Installation cancelled. No files were left behind.");
            ExitCode::from(130)
        }
        InstallerError::RollbackFailed { path, reason } => {
            tracing::error!(path = %path.display(), %reason, "rollback failed");
            eprintln!(
                "Installation did not abort cleanly.\nCheck [{}] for unwanted files.\n{}",
                path.display(),
                reason
            );
            ExitCode::from(3)
        }
        other => {
            tracing::error!(error = %other, "installation failed");
            eprintln!("There was a problem with the installation. Error: {}", other);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(ui: UiKind) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match ui {
        UiKind::Plain => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        UiKind::Terminal => {
            // 화면을 덮어쓰지 않도록 파일로 기록
            let path = default_log_path().context("no data directory for the log file")?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}

/// 종료 신호를 받으면 설치 취소 (두 번째 신호는 즉시 종료)
fn spawn_signal_watcher(cancel: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("signal watcher".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "signal handling unavailable");
                    return;
                }
            };

            runtime.block_on(async move {
                if wait_for_shutdown_signal().await.is_err() {
                    return;
                }
                tracing::info!("Shutdown signal received, cancelling installation...");
                cancel.cancel();

                if wait_for_shutdown_signal().await.is_ok() {
                    tracing::warn!("second shutdown signal received, exiting immediately");
                    std::process::exit(130);
                }
            });
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to start signal watcher");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
