use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::rolling::Rotation;

pub(crate) const DEFAULT_MAX_FILES: usize = 10;

/// How console lines are rendered on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<RotationPolicy> for Rotation {
    fn from(policy: RotationPolicy) -> Self {
        match policy {
            RotationPolicy::Minutely => Self::MINUTELY,
            RotationPolicy::Hourly => Self::HOURLY,
            RotationPolicy::Daily => Self::DAILY,
            RotationPolicy::Never => Self::NEVER,
        }
    }
}

/// Logging section of a configuration file, consumed by
/// [`Logger::from_config`](crate::Logger::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level (`error`, `warn`, `info`, `debug`, `trace`, `off`).
    pub level: String,
    /// Directive string such as `keel_s3store=debug`; overrides `RUST_LOG`.
    pub filter: Option<String>,
    pub console: bool,
    pub format: ConsoleFormat,
    /// Write rolling log files here as well.
    pub directory: Option<PathBuf>,
    pub rotation: RotationPolicy,
    pub max_files: usize,
    /// Write log files as JSON lines.
    pub file_json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            filter: None,
            console: true,
            format: ConsoleFormat::Compact,
            directory: None,
            rotation: RotationPolicy::Daily,
            max_files: DEFAULT_MAX_FILES,
            file_json: false,
        }
    }
}
