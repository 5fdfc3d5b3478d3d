//! FolderSync - Periodic one-way folder mirroring service
//!
//! Keeps a replica directory identical to a source directory:
//! - Runs a synchronization pass, sleeps for the configured interval, repeats
//! - Logs every change to the console and to a log file
//! - Stops gracefully on SIGTERM/SIGINT
//!
//! # Configuration
//!
//! Settings come from an optional YAML file (`--config`, or the platform
//! default location when present); command-line flags override file values.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use foldersync_core::config::{Config, ConfigBuilder};
use foldersync_core::domain::{
    CompareMode, FailurePolicy, KindMismatchPolicy, PassReport, SyncPair,
};
use foldersync_sync::engine::SyncEngine;
use foldersync_sync::scheduler::{SchedulerExit, SyncScheduler};
use foldersync_sync::sink::TracingEventSink;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod logging;

use logging::LogSink;

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "foldersync", version, about = "Periodic one-way folder mirroring")]
struct Cli {
    /// Directory to mirror [default: source]
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Directory kept identical to the source [default: replica]
    #[arg(long, value_name = "PATH")]
    replica: Option<PathBuf>,

    /// Log file, truncated at startup [default: log]
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Seconds between the end of a pass and the start of the next [default: 1]
    #[arg(long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reaction to a failed action: abort or continue [default: abort]
    #[arg(long, value_name = "POLICY")]
    on_error: Option<FailurePolicy>,

    /// How common files are compared: content or quick [default: content]
    #[arg(long, value_name = "MODE")]
    compare: Option<CompareMode>,

    /// Directory-vs-file collisions: replace or ignore [default: replace]
    #[arg(long, value_name = "POLICY")]
    kind_mismatch: Option<KindMismatchPolicy>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Verbose console output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================================
// Configuration
// ============================================================================

/// Loads the configuration file, if any, and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };

    let mut builder = ConfigBuilder::from_config(base);
    if let Some(source) = &cli.source {
        builder = builder.sync_source(source.clone());
    }
    if let Some(replica) = &cli.replica {
        builder = builder.sync_replica(replica.clone());
    }
    if let Some(seconds) = cli.interval {
        builder = builder.sync_interval_secs(seconds);
    }
    if let Some(policy) = cli.on_error {
        builder = builder.sync_on_error(policy);
    }
    if let Some(mode) = cli.compare {
        builder = builder.sync_compare(mode);
    }
    if let Some(policy) = cli.kind_mismatch {
        builder = builder.sync_kind_mismatch(policy);
    }
    if let Some(log) = &cli.log {
        builder = builder.logging_file(log.clone());
    }

    builder.build_validated().map_err(|errors| {
        let details: Vec<String> = errors.iter().map(|e| format!("  {e}")).collect();
        anyhow::anyhow!("Invalid configuration:\n{}", details.join("\n"))
    })
}

// ============================================================================
// Signal handling
// ============================================================================

/// Waits for SIGINT or SIGTERM, then cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

/// Maps a scheduler outcome to the process exit status
fn exit_code(exit: &SchedulerExit) -> ExitCode {
    if exit.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Exit status of a `--once` run; an interrupted pass still exits cleanly
fn once_exit_code(report: &PassReport) -> ExitCode {
    if report.cancelled || report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(config: Config, once: bool, log: &LogSink) -> Result<ExitCode> {
    let root = SyncPair::root(&config.sync.source, &config.sync.replica)
        .context("Invalid source/replica pair")?;

    info!(
        source = %root.source_dir().display(),
        replica = %root.replica_dir().display(),
        log = %log.path().display(),
        interval_secs = config.sync.interval_secs,
        compare = %config.sync.compare,
        kind_mismatch = %config.sync.kind_mismatch,
        on_error = %config.sync.on_error,
        "FolderSync starting"
    );

    let sink = Arc::new(TracingEventSink::new());
    let engine = SyncEngine::from_config(&config.sync, sink);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let mut scheduler = SyncScheduler::new(engine, root, config.interval(), shutdown);

    if once {
        let report = scheduler.run_once().await;
        if report.cancelled {
            info!("Sync stopped by signal");
            println!("Stopping sync...");
        }
        return Ok(once_exit_code(&report));
    }

    let exit = scheduler.run().await;
    match &exit {
        SchedulerExit::Cancelled => {
            info!(passes = scheduler.passes(), "Sync stopped by signal");
            println!("Stopping sync...");
        }
        SchedulerExit::Failed(report) => {
            error!(
                failures = report.failures.len(),
                "Synchronization aborted after a failed pass"
            );
        }
    }
    Ok(exit_code(&exit))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // The log file location must be known before anything else is logged.
    let config = resolve_config(&cli)?;
    let log = LogSink::open(&config.logging, cli.verbose)?;
    log.install()?;

    println!("Syncing...");

    let result = run(config, cli.once, &log).await;
    if let Err(e) = &result {
        error!(error = %e, "FolderSync exiting with error");
    }
    if let Err(e) = log.flush() {
        warn!(error = %e, "Cannot flush log file");
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["foldersync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_all_flags() {
        let cli = parse(&[
            "--source",
            "/srv/a",
            "--replica",
            "/srv/b",
            "--log",
            "/tmp/sync.log",
            "--interval",
            "30",
            "--on-error",
            "continue",
            "--compare",
            "quick",
            "--kind-mismatch",
            "ignore",
            "--once",
            "-vv",
        ]);

        assert_eq!(cli.source, Some(PathBuf::from("/srv/a")));
        assert_eq!(cli.replica, Some(PathBuf::from("/srv/b")));
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/sync.log")));
        assert_eq!(cli.interval, Some(30));
        assert_eq!(cli.on_error, Some(FailurePolicy::Continue));
        assert_eq!(cli.compare, Some(CompareMode::Quick));
        assert_eq!(cli.kind_mismatch, Some(KindMismatchPolicy::Ignore));
        assert!(cli.once);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        let result = Cli::try_parse_from(["foldersync", "--on-error", "retry"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "sync:\n  source: /data/in\n  replica: /data/out\n  interval_secs: 60\n  on_error: continue\nlogging:\n  level: warn\n",
        )
        .unwrap();

        let cli = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--interval",
            "5",
            "--replica",
            "/backup/out",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.sync.source, PathBuf::from("/data/in"));
        assert_eq!(config.sync.replica, PathBuf::from("/backup/out"));
        assert_eq!(config.sync.interval_secs, 5);
        assert_eq!(config.sync.on_error, FailurePolicy::Continue);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let cli = parse(&["--source", "/a", "--replica", "/b", "--interval", "0"]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("sync.interval_secs"));
    }

    #[test]
    fn test_nested_replica_is_rejected() {
        let cli = parse(&["--source", "/data", "--replica", "/data/mirror"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/foldersync.yaml"]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let debug = |code: ExitCode| format!("{code:?}");
        assert_eq!(
            debug(exit_code(&SchedulerExit::Cancelled)),
            debug(ExitCode::SUCCESS)
        );
        assert_eq!(
            debug(exit_code(&SchedulerExit::Failed(Default::default()))),
            debug(ExitCode::FAILURE)
        );
    }

    #[test]
    fn test_once_exit_code_treats_interrupted_pass_as_clean() {
        let debug = |code: ExitCode| format!("{code:?}");
        let mut report = PassReport::begin();
        assert_eq!(debug(once_exit_code(&report)), debug(ExitCode::SUCCESS));

        report.fail(
            foldersync_core::domain::FailureStage::Listing,
            std::path::Path::new("/src"),
            "gone",
        );
        assert_eq!(debug(once_exit_code(&report)), debug(ExitCode::FAILURE));

        report.cancelled = true;
        assert_eq!(debug(once_exit_code(&report)), debug(ExitCode::SUCCESS));
    }

    #[test]
    fn test_cancellation_token_cancel() {
        let token = CancellationToken::new();
        let child = token.child_token();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(child.is_cancelled());
    }
}
