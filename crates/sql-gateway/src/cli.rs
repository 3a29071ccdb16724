use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    DEFAULT_DATABASE, DEFAULT_MAX_ROWS, DEFAULT_OUTPUT_LOCATION, DEFAULT_WORKGROUP,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "sql-gateway")]
pub struct Args {
    /// Handle a single inbound envelope from this file ("-" reads stdin) and exit.
    #[arg(long, conflicts_with = "render")]
    pub event: Option<PathBuf>,

    /// Read agent text from stdin and render the embedded result table.
    #[arg(long)]
    pub render: bool,

    /// With --render: also export the table as CSV to this path.
    #[arg(long, requires = "render")]
    pub csv: Option<PathBuf>,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Location recorded with every submitted execution for its results.
    #[arg(long, env = "OUTPUT_LOCATION", default_value = DEFAULT_OUTPUT_LOCATION)]
    pub output_location: String,

    /// Database used when a request does not name one.
    #[arg(long, env = "DEFAULT_DB", default_value = DEFAULT_DATABASE)]
    pub default_database: String,

    /// Workgroup used when a request does not name one.
    #[arg(long, env = "DEFAULT_WG", default_value = DEFAULT_WORKGROUP)]
    pub default_workgroup: String,

    /// Maximum rows returned per query.
    #[arg(long, env = "MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Delay between execution status checks.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 600)]
    pub poll_interval_ms: u64,

    /// Directory holding one `<database>.db` SQLite file per database.
    #[arg(long, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,
}
