//! bi-seed CLI Library
//!
//! Bootstraps a freshly started BI web application instance.
//!
//! # Overview
//!
//! A run goes through the following stages, strictly in order:
//!
//! - **Probe**: poll the login endpoint until the API answers
//! - **Authenticate**: log in and fetch a CSRF token
//! - **Register**: create one database connection per `CONNECTION_*` spec,
//!   checking reachability first in production mode
//! - **Import**: upload `database_*.zip`, `dataset_*.zip`, `chart_*.zip` and
//!   `dashboard_*.zip` bundles in that order
//!
//! Probe and authentication failures abort the run. Registration and import
//! failures are counted per item and reported in the final summary.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod artifact;
pub mod config;
pub mod connection;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stages;

// Re-export commonly used types
pub use artifact::ArtifactKind;
pub use config::{RunConfig, RunMode};
pub use error::{Result, SeedError};
pub use pipeline::{run, RunSummary};

use clap::Parser;
use config::{
    DEFAULT_BASE_URL, DEFAULT_CONNECTION_PREFIX, DEFAULT_EXCLUDED_ARTIFACT, DEFAULT_PASSWORD,
    DEFAULT_USERNAME,
};
use std::path::PathBuf;

/// bi-seed - register database connections and import exported bundles into
/// a BI web application
#[derive(Parser, Debug)]
#[command(name = "bi-seed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the application
    #[arg(long, env = "SUPERSET_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Login user name
    #[arg(long, env = "SUPERSET_USERNAME", default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// Login password
    #[arg(long, env = "SUPERSET_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// Run environment; `prod` turns on connectivity checks and artifact exclusions
    #[arg(long = "env", env = "env")]
    pub environment: Option<String>,

    /// Directory holding the `{kind}_*.zip` bundles (defaults to the executable's directory)
    #[arg(long, env = "BI_SEED_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Environment variables starting with this prefix hold connection specs
    #[arg(long, env = "BI_SEED_CONNECTION_PREFIX", default_value = DEFAULT_CONNECTION_PREFIX)]
    pub connection_prefix: String,

    /// Extra connection spec `Name:UUID:URI` (repeatable)
    #[arg(long = "connection", value_name = "SPEC")]
    pub connections: Vec<String>,

    /// Only import these artifact kinds (repeatable; default all)
    #[arg(long = "kind", value_enum)]
    pub kinds: Vec<ArtifactKind>,

    /// File name prefixes skipped in production, as `kind=prefix`; a bare
    /// prefix applies to database bundles only
    #[arg(
        long = "exclude-artifact",
        env = "BI_SEED_EXCLUDE_ARTIFACTS",
        value_delimiter = ',',
        default_value = DEFAULT_EXCLUDED_ARTIFACT
    )]
    pub exclude_artifacts: Vec<String>,

    /// Ask the import endpoints to overwrite existing objects
    #[arg(long, env = "BI_SEED_OVERWRITE")]
    pub overwrite: bool,

    /// Attempts while waiting for the API
    #[arg(long, env = "BI_SEED_PROBE_ATTEMPTS", default_value_t = 30)]
    pub probe_attempts: u32,

    /// Seconds between API probes
    #[arg(long, env = "BI_SEED_PROBE_INTERVAL", default_value_t = 10)]
    pub probe_interval: u64,

    /// Authentication attempts
    #[arg(long, env = "BI_SEED_AUTH_ATTEMPTS", default_value_t = 10)]
    pub auth_attempts: u32,

    /// Seconds between authentication attempts
    #[arg(long, env = "BI_SEED_AUTH_INTERVAL", default_value_t = 10)]
    pub auth_interval: u64,

    /// Connectivity attempts per database (production only)
    #[arg(long, env = "BI_SEED_CONNECTIVITY_ATTEMPTS", default_value_t = 6)]
    pub connectivity_attempts: u32,

    /// Seconds between connectivity attempts
    #[arg(long, env = "BI_SEED_CONNECTIVITY_INTERVAL", default_value_t = 10)]
    pub connectivity_interval: u64,

    /// Wall-clock limit in seconds for one connectivity attempt
    #[arg(long, env = "BI_SEED_CONNECTIVITY_TIMEOUT", default_value_t = 30)]
    pub connectivity_timeout: u64,

    /// Per-upload HTTP timeout in seconds
    #[arg(long, env = "BI_SEED_UPLOAD_TIMEOUT", default_value_t = 300)]
    pub upload_timeout: u64,

    /// Exit with status 2 when any registration or upload failed
    #[arg(long, env = "BI_SEED_FAIL_ON_ERROR")]
    pub fail_on_error: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}
