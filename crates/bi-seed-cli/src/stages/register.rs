//! Database connection registration
//!
//! Creates one database-connection record per configured spec. Already
//! registered names count as success, so re-running a bootstrap is safe.

use crate::api::{CreateOutcome, Session};
use crate::connection::ConnectionEntry;
use crate::stages::connectivity::ConnectivityCheck;
use tracing::{error, info, warn};

/// Per-run registration counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub created: usize,
    pub already_present: usize,
    pub failed: usize,
    /// Unreachable in production, never sent to the API
    pub skipped: usize,
}

impl RegistrationReport {
    pub fn success_count(&self) -> usize {
        self.created + self.already_present
    }

    pub fn failure_count(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.created + self.already_present + self.failed + self.skipped
    }
}

/// Register every entry, never stopping early
///
/// Malformed specs and rejected create calls are counted as failures. When
/// `connectivity` is given (production), each database is checked first and
/// skipped if it cannot be reached.
pub async fn register_connections(
    session: &Session,
    entries: &[ConnectionEntry],
    connectivity: Option<&dyn ConnectivityCheck>,
) -> RegistrationReport {
    let mut report = RegistrationReport::default();

    if entries.is_empty() {
        warn!("No connection specs configured");
        return report;
    }

    info!(count = entries.len(), "Registering database connections");

    for entry in entries {
        let spec = match entry.parse() {
            Ok(spec) => spec,
            Err(e) => {
                error!(source = %entry.source, error = %e, "Invalid connection spec");
                report.failed += 1;
                continue;
            },
        };

        info!(
            source = %entry.source,
            database = %spec.name,
            uri = %spec.redacted_uri(),
            "Processing connection"
        );

        if let Some(checker) = connectivity {
            if !checker.is_reachable(&spec).await {
                warn!(database = %spec.name, "Skipping connection, database not accessible");
                report.skipped += 1;
                continue;
            }
        }

        match session.create_database(&spec).await {
            Ok(CreateOutcome::Created) => {
                info!(database = %spec.name, "Database connection created");
                report.created += 1;
            },
            Ok(CreateOutcome::AlreadyExists) => {
                info!(database = %spec.name, "Database connection already exists, skipping");
                report.already_present += 1;
            },
            Err(e) => {
                error!(database = %spec.name, error = %e, "Database connection creation failed");
                report.failed += 1;
            },
        }
    }

    info!(
        created = report.created,
        already_present = report.already_present,
        failed = report.failed,
        skipped = report.skipped,
        "Database connections processed"
    );

    report
}
