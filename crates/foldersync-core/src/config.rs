//! Configuration module for FolderSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Command-line flags are applied on top of a loaded [`Config`] by the service
//! binary through [`ConfigBuilder`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{CompareMode, FailurePolicy, KindMismatchPolicy, SyncPair};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for FolderSync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Mirroring settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root of the tree being mirrored. Never modified.
    pub source: PathBuf,
    /// Root of the mirror. Created before a pass if absent.
    pub replica: PathBuf,
    /// Seconds to sleep between the end of a pass and the start of the next.
    pub interval_secs: u64,
    /// How common files are compared: `content` or `quick`.
    pub compare: CompareMode,
    /// Directory-vs-file collisions: `replace` or `ignore`.
    pub kind_mismatch: KindMismatchPolicy,
    /// Reaction to a failed action: `abort` or `continue`.
    pub on_error: FailurePolicy,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console log level: `trace`, `debug`, `info`, `warn`, or `error`.
    ///
    /// Defaults to `debug` so the console shows every change as it happens.
    /// The log file always records `debug` and above.
    pub level: String,
    /// Path to the log file. Truncated at startup.
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// Missing sections and fields take their default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/foldersync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("foldersync")
            .join("config.yaml")
    }

    /// The pause between two passes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("source"),
            replica: PathBuf::from("replica"),
            interval_secs: 1,
            compare: CompareMode::default(),
            kind_mismatch: KindMismatchPolicy::default(),
            on_error: FailurePolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            file: PathBuf::from("log"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. The source tree is
    /// not required to exist yet; a missing source surfaces as a failed pass.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Err(e) = SyncPair::root(&self.sync.source, &self.sync.replica) {
            errors.push(ValidationError {
                field: "sync.replica".into(),
                message: e.to_string(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.logging.file.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "logging.file".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] (or an existing config) and allows
/// selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use foldersync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_source(PathBuf::from("/srv/data"))
///     .sync_replica(PathBuf::from("/mnt/backup/data"))
///     .sync_interval_secs(60)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create a builder that starts from an already loaded configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- sync ---

    pub fn sync_source(mut self, source: PathBuf) -> Self {
        self.config.sync.source = source;
        self
    }

    pub fn sync_replica(mut self, replica: PathBuf) -> Self {
        self.config.sync.replica = replica;
        self
    }

    pub fn sync_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    pub fn sync_compare(mut self, mode: CompareMode) -> Self {
        self.config.sync.compare = mode;
        self
    }

    pub fn sync_kind_mismatch(mut self, policy: KindMismatchPolicy) -> Self {
        self.config.sync.kind_mismatch = policy;
        self
    }

    pub fn sync_on_error(mut self, policy: FailurePolicy) -> Self {
        self.config.sync.on_error = policy;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_file(mut self, file: PathBuf) -> Self {
        self.config.logging.file = file;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.sync.source, PathBuf::from("source"));
        assert_eq!(cfg.sync.replica, PathBuf::from("replica"));
        assert_eq!(cfg.sync.interval_secs, 1);
        assert_eq!(cfg.sync.compare, CompareMode::Content);
        assert_eq!(cfg.sync.kind_mismatch, KindMismatchPolicy::Replace);
        assert_eq!(cfg.sync.on_error, FailurePolicy::Abort);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.file, PathBuf::from("log"));
        assert_eq!(cfg.interval(), Duration::from_secs(1));
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("foldersync/config.yaml"));
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
sync:
  source: /srv/data
  replica: /mnt/backup/data
  interval_secs: 30
  compare: quick
  kind_mismatch: ignore
  on_error: continue
logging:
  level: warn
  file: /var/log/foldersync.log
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.sync.source, PathBuf::from("/srv/data"));
        assert_eq!(cfg.sync.replica, PathBuf::from("/mnt/backup/data"));
        assert_eq!(cfg.sync.interval_secs, 30);
        assert_eq!(cfg.sync.compare, CompareMode::Quick);
        assert_eq!(cfg.sync.kind_mismatch, KindMismatchPolicy::Ignore);
        assert_eq!(cfg.sync.on_error, FailurePolicy::Continue);
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.file, PathBuf::from("/var/log/foldersync.log"));
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let yaml = "sync:\n  interval_secs: 5\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.sync.interval_secs, 5);
        assert_eq!(cfg.sync.source, PathBuf::from("source"));
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn load_rejects_unknown_policy() {
        let yaml = "sync:\n  on_error: retry\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/foldersync.yaml"));
        assert_eq!(cfg, Config::default());
    }

    // -- Validation --

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = ConfigBuilder::new().sync_interval_secs(0).build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sync.interval_secs");
    }

    #[test]
    fn nested_replica_is_rejected() {
        let cfg = ConfigBuilder::new()
            .sync_source(PathBuf::from("/srv/data"))
            .sync_replica(PathBuf::from("/srv/data/mirror"))
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sync.replica");
    }

    #[test]
    fn invalid_level_is_rejected() {
        let cfg = ConfigBuilder::new().logging_level("verbose").build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "logging.level");
        assert!(errors[0].to_string().contains("valid options"));
    }

    #[test]
    fn build_validated_collects_all_errors() {
        let result = ConfigBuilder::new()
            .sync_interval_secs(0)
            .logging_level("loud")
            .logging_file(PathBuf::new())
            .build_validated();

        let errors = result.unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["sync.interval_secs", "logging.level", "logging.file"]
        );
    }

    // -- Builder --

    #[test]
    fn builder_overrides_loaded_config() {
        let base = ConfigBuilder::new().sync_interval_secs(10).build();
        let cfg = ConfigBuilder::from_config(base)
            .sync_on_error(FailurePolicy::Continue)
            .sync_compare(CompareMode::Quick)
            .sync_kind_mismatch(KindMismatchPolicy::Ignore)
            .build();

        assert_eq!(cfg.sync.interval_secs, 10);
        assert_eq!(cfg.sync.on_error, FailurePolicy::Continue);
        assert_eq!(cfg.sync.compare, CompareMode::Quick);
        assert_eq!(cfg.sync.kind_mismatch, KindMismatchPolicy::Ignore);
    }

    #[test]
    fn yaml_roundtrip_preserves_values() {
        let cfg = ConfigBuilder::new()
            .sync_source(PathBuf::from("/a"))
            .sync_replica(PathBuf::from("/b"))
            .sync_on_error(FailurePolicy::Continue)
            .build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
    }
}
