use std::time::Duration;

use crate::cli::Args;

pub const DEFAULT_OUTPUT_LOCATION: &str = "file:///tmp/sql-gateway/results/";
pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_WORKGROUP: &str = "primary";
pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(600);

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub output_location: String,
    pub default_database: String,
    pub default_workgroup: String,
    pub max_rows: usize,
    pub poll_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            output_location: DEFAULT_OUTPUT_LOCATION.to_string(),
            default_database: DEFAULT_DATABASE.to_string(),
            default_workgroup: DEFAULT_WORKGROUP.to_string(),
            max_rows: DEFAULT_MAX_ROWS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl GatewayConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            output_location: args.output_location.clone(),
            default_database: args.default_database.clone(),
            default_workgroup: args.default_workgroup.clone(),
            max_rows: args.max_rows.max(1),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
        }
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Row cap for a single result fetch; the backend never pages more
    /// than 1000 rows at once.
    pub fn fetch_cap(&self) -> usize {
        self.max_rows.min(1000)
    }
}
