//! Run configuration
//!
//! Everything a run needs is resolved once at startup into a [`RunConfig`]
//! and handed to each stage. Stages never read the environment themselves.

use crate::artifact::ArtifactKind;
use crate::connection::ConnectionEntry;
use crate::error::{Result, SeedError};
use crate::Cli;
use bi_seed_common::RetryPolicy;
use clap::ValueEnum;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8089";
pub const DEFAULT_USERNAME: &str = "superset_admin";
pub const DEFAULT_PASSWORD: &str = "superset";

/// Environment variables with this prefix hold connection specs
pub const DEFAULT_CONNECTION_PREFIX: &str = "CONNECTION_";

/// Legacy export that must not be re-imported in production
pub const DEFAULT_EXCLUDED_ARTIFACT: &str = "database_export_20250831T122711";

/// Production vs. everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Production,
    #[default]
    Development,
}

impl RunMode {
    /// `prod` (any case) selects production; anything else, including unset,
    /// is development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("prod") => RunMode::Production,
            _ => RunMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Production => write!(f, "PRODUCTION"),
            RunMode::Development => write!(f, "DEVELOPMENT"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Per-call HTTP timeouts
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub probe: Duration,
    pub auth: Duration,
    pub create_database: Duration,
    pub upload: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            auth: Duration::from_secs(10),
            create_database: Duration::from_secs(30),
            upload: Duration::from_secs(300),
        }
    }
}

/// Retry settings for each polling stage
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    pub probe: RetryPolicy,
    pub auth: RetryPolicy,
    pub connectivity: RetryPolicy,
    /// Wall-clock bound on a single reachability attempt
    pub connectivity_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            probe: RetryPolicy::from_secs(30, 10),
            auth: RetryPolicy::from_secs(10, 10),
            connectivity: RetryPolicy::from_secs(6, 10),
            connectivity_timeout: Duration::from_secs(30),
        }
    }
}

/// One excluded file name prefix, scoped to an artifact kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactExclusion {
    pub kind: ArtifactKind,
    pub prefix: String,
}

impl ArtifactExclusion {
    pub fn new(kind: ArtifactKind, prefix: impl Into<String>) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
        }
    }

    /// `kind=prefix`, or a bare prefix for database bundles
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (kind, prefix) = match raw.split_once('=') {
            Some((kind, prefix)) => {
                let kind = ArtifactKind::from_str(kind.trim(), true).map_err(|_| {
                    SeedError::config(format!("unknown artifact kind in exclusion '{raw}'"))
                })?;
                (kind, prefix.trim())
            },
            None => (ArtifactKind::Database, raw),
        };

        if prefix.is_empty() {
            return Err(SeedError::config(format!("empty prefix in exclusion '{raw}'")));
        }
        Ok(Self::new(kind, prefix))
    }
}

/// Which artifact files to skip
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
    /// Only honoured in production
    pub exclusions: Vec<ArtifactExclusion>,
}

impl ArtifactFilter {
    /// The legacy database export that must not be re-imported
    pub fn legacy_default() -> Self {
        Self {
            exclusions: vec![ArtifactExclusion::new(
                ArtifactKind::Database,
                DEFAULT_EXCLUDED_ARTIFACT,
            )],
        }
    }

    pub fn is_excluded(&self, mode: RunMode, kind: ArtifactKind, file_name: &str) -> bool {
        mode.is_production()
            && self
                .exclusions
                .iter()
                .any(|e| e.kind == kind && file_name.starts_with(e.prefix.as_str()))
    }
}

/// Fully resolved settings for one bootstrap run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub mode: RunMode,
    pub connections: Vec<ConnectionEntry>,
    pub artifact_dir: PathBuf,
    pub artifact_kinds: Vec<ArtifactKind>,
    pub artifact_filter: ArtifactFilter,
    /// Ask the import endpoints to overwrite existing objects
    pub overwrite: bool,
    pub retry: RetrySettings,
    pub timeouts: Timeouts,
}

impl RunConfig {
    /// Development-mode config against `base_url` with default settings
    pub fn new(base_url: impl Into<String>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            credentials: Credentials {
                username: DEFAULT_USERNAME.to_string(),
                password: DEFAULT_PASSWORD.to_string(),
            },
            mode: RunMode::Development,
            connections: Vec::new(),
            artifact_dir: artifact_dir.into(),
            artifact_kinds: ArtifactKind::IMPORT_ORDER.to_vec(),
            artifact_filter: ArtifactFilter::legacy_default(),
            overwrite: false,
            retry: RetrySettings::default(),
            timeouts: Timeouts::default(),
        }
    }

    /// Build from parsed arguments plus a snapshot of the environment
    ///
    /// `vars` is scanned once for connection specs; pass the output of
    /// [`utf8_vars`] in production and a fixed list in tests.
    pub fn from_cli<I>(cli: &Cli, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if cli.base_url.trim().is_empty() {
            return Err(SeedError::config("base URL must not be empty"));
        }
        url::Url::parse(cli.base_url.trim())
            .map_err(|e| SeedError::config(format!("invalid base URL '{}': {e}", cli.base_url)))?;

        let artifact_dir = match &cli.artifact_dir {
            Some(dir) => dir.clone(),
            None => default_artifact_dir(),
        };

        let mut connections = collect_connection_entries(vars, &cli.connection_prefix);
        connections.extend(
            cli.connections
                .iter()
                .enumerate()
                .map(|(i, raw)| ConnectionEntry::new(format!("--connection[{i}]"), raw.clone())),
        );

        let artifact_kinds = if cli.kinds.is_empty() {
            ArtifactKind::IMPORT_ORDER.to_vec()
        } else {
            // Always processed in dependency order, whatever order was given
            ArtifactKind::IMPORT_ORDER
                .into_iter()
                .filter(|kind| cli.kinds.contains(kind))
                .collect()
        };

        let artifact_filter = ArtifactFilter {
            exclusions: cli
                .exclude_artifacts
                .iter()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| ArtifactExclusion::parse(raw))
                .collect::<Result<_>>()?,
        };

        Ok(Self {
            base_url: normalize_base_url(&cli.base_url),
            credentials: Credentials {
                username: cli.username.clone(),
                password: cli.password.clone(),
            },
            mode: RunMode::from_env_value(cli.environment.as_deref()),
            connections,
            artifact_dir,
            artifact_kinds,
            artifact_filter,
            overwrite: cli.overwrite,
            retry: RetrySettings {
                probe: RetryPolicy::from_secs(cli.probe_attempts, cli.probe_interval),
                auth: RetryPolicy::from_secs(cli.auth_attempts, cli.auth_interval),
                connectivity: RetryPolicy::from_secs(
                    cli.connectivity_attempts,
                    cli.connectivity_interval,
                ),
                connectivity_timeout: Duration::from_secs(cli.connectivity_timeout),
            },
            timeouts: Timeouts {
                upload: Duration::from_secs(cli.upload_timeout),
                ..Timeouts::default()
            },
        })
    }
}

/// Keep the environment pairs whose name and value are valid UTF-8
///
/// Other pairs are dropped. Dropping one whose name starts with
/// `connection_prefix` is logged, since that connection will be missing.
pub fn utf8_vars<I>(vars: I, connection_prefix: &str) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                let name = name.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
                if name.starts_with(connection_prefix) {
                    warn!(variable = %name, "Skipping connection variable that is not valid UTF-8");
                }
                None
            },
        })
        .collect()
}

/// Collect `prefix*` variables into connection entries, sorted by name
pub fn collect_connection_entries<I>(vars: I, prefix: &str) -> Vec<ConnectionEntry>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut entries: Vec<ConnectionEntry> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(name, value)| ConnectionEntry::new(name, value))
        .collect();
    entries.sort_by(|a, b| a.source.cmp(&b.source));
    entries
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Directory holding the running executable, else the working directory
fn default_artifact_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
