//! Run orchestration
//!
//! Stages run strictly in sequence. Probe and authentication failures end
//! the run; registration and import record per-item failures and carry on.

use crate::api::SupersetClient;
use crate::artifact::ArtifactKind;
use crate::config::{RunConfig, RunMode};
use crate::error::Result;
use crate::stages::connectivity::{ConnectivityCheck, ConnectivityTester};
use crate::stages::import::{import_artifacts, ImportOptions, ImportReport};
use crate::stages::register::{register_connections, RegistrationReport};
use crate::stages::{auth, probe};
use chrono::{DateTime, Local};
use std::fmt;
use tracing::info;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    NotStarted,
    ProbingApi,
    Authenticating,
    RegisteringConnections,
    ImportingArtifacts(ArtifactKind),
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::NotStarted => write!(f, "not started"),
            RunStage::ProbingApi => write!(f, "probing API"),
            RunStage::Authenticating => write!(f, "authenticating"),
            RunStage::RegisteringConnections => write!(f, "registering connections"),
            RunStage::ImportingArtifacts(kind) => write!(f, "importing {kind} artifacts"),
            RunStage::Done => write!(f, "done"),
        }
    }
}

/// Outcome of a run that got past authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: RunMode,
    pub started_at: DateTime<Local>,
    pub registration: RegistrationReport,
    pub import: ImportReport,
}

impl RunSummary {
    /// No upload failed and, in production, no registration failed
    pub fn is_clean(&self) -> bool {
        self.import.failed() == 0
            && (!self.mode.is_production() || self.registration.failure_count() == 0)
    }

    /// Any per-item failure at all, whatever the mode
    pub fn has_failures(&self) -> bool {
        self.import.failed() > 0 || self.registration.failure_count() > 0
    }
}

struct StageTracker {
    current: RunStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: RunStage::NotStarted,
        }
    }

    fn advance(&mut self, next: RunStage) {
        info!(from = %self.current, to = %next, "Run stage changed");
        self.current = next;
    }
}

/// Run every stage against the configured instance
///
/// Returns `Err` only for fatal conditions: the API never came up or
/// authentication was exhausted.
pub async fn run(config: &RunConfig) -> Result<RunSummary> {
    let started_at = Local::now();
    let mut stage = StageTracker::new();

    info!(
        started_at = %started_at.format("%Y-%m-%d %H:%M:%S"),
        base_url = %config.base_url,
        mode = %config.mode,
        artifact_dir = %config.artifact_dir.display(),
        "Starting bootstrap run"
    );

    let client = SupersetClient::new(&config.base_url, config.timeouts)?;

    stage.advance(RunStage::ProbingApi);
    probe::require_api(&client, &config.retry.probe).await?;

    stage.advance(RunStage::Authenticating);
    let session = auth::authenticate(&client, &config.credentials, &config.retry.auth).await?;

    stage.advance(RunStage::RegisteringConnections);
    let tester = config.mode.is_production().then(|| {
        ConnectivityTester::new(config.retry.connectivity, config.retry.connectivity_timeout)
    });
    let registration = register_connections(
        &session,
        &config.connections,
        tester.as_ref().map(|t| t as &dyn ConnectivityCheck),
    )
    .await;

    let mut import = ImportReport::default();
    for &kind in &config.artifact_kinds {
        stage.advance(RunStage::ImportingArtifacts(kind));
        let kinds = [kind];
        let report = import_artifacts(
            &session,
            ImportOptions {
                dir: &config.artifact_dir,
                kinds: &kinds,
                mode: config.mode,
                filter: &config.artifact_filter,
                overwrite: config.overwrite,
            },
        )
        .await;
        import.kinds.extend(report.kinds);
    }

    stage.advance(RunStage::Done);

    Ok(RunSummary {
        mode: config.mode,
        started_at,
        registration,
        import,
    })
}
