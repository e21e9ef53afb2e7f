//! # Keel CLI
//!
//! The `keel` binary: one keyspace operation per invocation against an
//! S3-backed store.
//!
//! ```text
//! keel -a tenants@reports:eu-central-1 --sub team -k docs put greeting hello
//! keel -a tenants@reports:eu-central-1 --sub team -k docs list --start g
//! ```
//!
//! Settings come from `keel.toml` (or `--config`), then `KEEL__STORE__*` /
//! `KEEL__LOG__*` environment variables, then command-line flags.

mod cli;
mod commands;
mod settings;

pub use cli::{Cli, Command};
pub use commands::{execute, open_keyspace};
pub use settings::{DEFAULT_CONFIG_FILE, ENV_PREFIX, KeelConfig, SettingsError, SettingsErrorExt, load_config};
