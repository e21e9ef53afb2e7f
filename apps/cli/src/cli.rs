use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "keel", about = "Read and edit byte keyspaces stored in S3", version)]
pub struct Cli {
    /// Store address: `[prefix@]bucket:region[?read_qps=N&write_qps=N]`.
    /// Overrides the location and rates from the configuration file.
    #[arg(short, long, global = true)]
    pub address: Option<String>,

    /// Configuration file; `keel.toml` is read when present.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keyspace name inside the selected namespace.
    #[arg(short, long, global = true, default_value = "")]
    pub keyspace: String,

    /// Descend into a nested namespace. Repeat to go deeper.
    #[arg(long = "sub", global = true, value_name = "NAME")]
    pub subs: Vec<String>,

    /// Give up on each command after this many seconds.
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Overrides `log.level` (error, warn, info, debug, trace, off).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Keys are given in display form: printable text verbatim, anything else as `hex:<digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the value stored under KEY
    Get { key: String },
    /// Store a value; reads stdin when VALUE is omitted
    Put {
        key: String,
        value: Option<String>,
        /// Overwrite an existing value
        #[arg(long)]
        replace: bool,
    },
    /// Remove KEY
    Delete { key: String },
    /// Print which of the given keys are present
    Has {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print keys in order, starting at --start
    List {
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the number of keys
    Len,
}
