//! Log sink for the service binary
//!
//! Every record goes to two places at once:
//! - the console (stderr), filtered by `logging.level`, `-v` or `RUST_LOG`
//! - the log file, always at DEBUG, without ANSI colours
//!
//! The log file is truncated when the sink is opened.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use foldersync_core::config::LoggingConfig;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LogInitError {
    /// The log file could not be created or truncated
    #[error("Cannot open log file {path}: {source}")]
    Open {
        /// Configured log file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Another global subscriber was installed first
    #[error("Cannot install log subscriber: {0}")]
    Install(#[from] SetGlobalDefaultError),
}

/// Console verbosity for a `-v` count, starting from the configured level
fn console_level(configured: &str, verbose: u8) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Owner of the log file handle
///
/// Built once in `main`. Dropping the sink flushes the file; the handle is
/// closed once the installed subscriber releases its clone as well.
#[derive(Debug)]
pub struct LogSink {
    file: Arc<File>,
    path: PathBuf,
    console_level: String,
}

impl LogSink {
    /// Creates (or truncates) the log file described by `config`
    pub fn open(config: &LoggingConfig, verbose: u8) -> Result<Self, LogInitError> {
        let file = File::create(&config.file).map_err(|source| LogInitError::Open {
            path: config.file.clone(),
            source,
        })?;

        Ok(Self {
            file: Arc::new(file),
            path: config.file.clone(),
            console_level: console_level(&config.level, verbose).to_string(),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Builds the two-layer subscriber without installing it
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.console_level));

        let console = fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(console_filter);

        let file = fmt::layer()
            .with_writer(Arc::clone(&self.file))
            .with_ansi(false)
            .with_target(false)
            .with_filter(LevelFilter::DEBUG);

        tracing_subscriber::registry().with(console).with(file)
    }

    /// Installs the subscriber as the process-wide default
    pub fn install(&self) -> Result<(), LogInitError> {
        tracing::subscriber::set_global_default(self.subscriber())?;
        Ok(())
    }

    /// Forces buffered records to disk
    pub fn flush(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config(dir: &TempDir, level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            file: dir.path().join("log"),
        }
    }

    #[test]
    fn test_console_level_from_verbosity() {
        assert_eq!(console_level("warn", 0), "warn");
        assert_eq!(console_level("warn", 1), "debug");
        assert_eq!(console_level("warn", 3), "trace");
    }

    #[test]
    fn test_open_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "info");
        std::fs::write(&config.file, "previous run\n").unwrap();

        let sink = LogSink::open(&config, 0).unwrap();

        assert_eq!(sink.path(), config.file.as_path());
        assert_eq!(std::fs::read_to_string(&config.file).unwrap(), "");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            file: dir.path().join("missing/log"),
        };

        let err = LogSink::open(&config, 0).unwrap_err();
        assert!(matches!(err, LogInitError::Open { .. }));
        assert!(err.to_string().contains("missing/log"));
    }

    #[test]
    fn test_file_layer_records_debug_without_ansi() {
        let dir = TempDir::new().unwrap();
        // Console stays quiet; the file still gets DEBUG.
        let sink = LogSink::open(&config(&dir, "error"), 0).unwrap();

        tracing::subscriber::with_default(sink.subscriber(), || {
            tracing::debug!("File /dst/a.txt is created");
            tracing::error!("Unexpected error occurred during delete_file of /dst/b");
            tracing::trace!("not recorded");
        });
        sink.flush().unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2, "{content}");
        assert!(lines[0].contains("DEBUG"));
        assert!(lines[0].ends_with("File /dst/a.txt is created"));
        assert!(lines[1].contains("ERROR"));
        assert!(!content.contains('\u{1b}'));
    }

    #[tokio::test]
    async fn test_action_records_are_plain_lines() {
        use foldersync_core::domain::SyncPair;
        use foldersync_sync::engine::{EngineOptions, SyncEngine};
        use foldersync_sync::sink::TracingEventSink;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let replica = dir.path().join("replica");
        std::fs::create_dir(&source).unwrap();
        std::fs::create_dir(&replica).unwrap();
        std::fs::write(source.join("a.txt"), b"a").unwrap();

        let sink = LogSink::open(&config(&dir, "error"), 0).unwrap();
        let engine = SyncEngine::new(Arc::new(TracingEventSink::new()), EngineOptions::default());
        {
            let _guard = tracing::subscriber::set_default(sink.subscriber());
            let report = engine
                .run_pass(&SyncPair::new(source, replica.clone()))
                .await;
            assert_eq!(report.files_created, 1);
        }
        sink.flush().unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let expected = format!("File {} is created", replica.join("a.txt").display());
        let record = content
            .lines()
            .find(|line| line.contains(&expected))
            .unwrap_or_else(|| panic!("no action record in:\n{content}"));
        assert!(record.contains("DEBUG"));
        assert!(record.ends_with(&expected), "{record}");
        assert!(!content.contains("run_pass"), "{content}");
        assert!(!content.contains("apply{"), "{content}");
        assert!(!content.contains("action="), "{content}");
    }
}
