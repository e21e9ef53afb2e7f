use crate::cli::Cli;
use config::{Config, Environment, File};
use keel_logger::LogConfig;
use keel_s3store::{Address, StoreConfig, StoreError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "keel.toml";
pub const ENV_PREFIX: &str = "KEEL";

#[keel_derive::keel_error]
pub enum SettingsError {
    #[error("Config error{}: {source}", format_context(context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Address error{}: {source}", format_context(context))]
    Address { source: StoreError, context: Option<Cow<'static, str>> },
}

/// Everything the `keel` binary reads from its configuration file.
///
/// ```toml
/// [store]
/// bucket = "reports"
/// region = "eu-central-1"
/// prefix = "tenants/acme"
/// read_qps = 100
///
/// [log]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeelConfig {
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// Loads `path` (or `keel.toml` if present) and overlays `KEEL__SECTION__KEY`
/// environment variables.
///
/// # Errors
/// [`SettingsError::Config`] if an explicitly named file is missing or any
/// source fails to parse.
pub fn load_config(path: Option<&Path>) -> Result<KeelConfig, SettingsError> {
    let required = path.is_some();
    let effective_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

    debug!(path = %effective_path.display(), required, "Loading config");

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<KeelConfig>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

impl KeelConfig {
    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// # Errors
    /// [`SettingsError::Address`] for a malformed `--address`.
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self, SettingsError> {
        if let Some(address) = &cli.address {
            let address = address.parse::<Address>().context("Parsing --address")?;
            self.store = self.store.with_address(&address);
        }
        if let Some(level) = &cli.log_level {
            self.log.level.clone_from(level);
        }
        Ok(self)
    }
}
