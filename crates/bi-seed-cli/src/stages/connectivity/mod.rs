//! Pre-registration reachability check (production runs only)
//!
//! Before a connection is registered, a throwaway connection is opened to the
//! target database and a trivial query is run. Databases that stay
//! unreachable for the whole retry budget are skipped instead of registered.

pub mod dialect;
pub mod probes;

use crate::connection::ConnectionSpec;
use crate::error::{Result, SeedError};
use async_trait::async_trait;
use bi_seed_common::{retry_fixed, truncate_chars, RetryPolicy};
use dialect::{ConnectionPreset, DatabaseFamily, DialectRegistry, ProbeStrategy};
use std::time::Duration;
use tracing::{error, info, warn};

/// Longest driver error kept in attempt logs
const MAX_ERROR_CHARS: usize = 150;

/// Decides whether a connection's database can be reached
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn is_reachable(&self, spec: &ConnectionSpec) -> bool;
}

/// Retrying reachability tester backed by a [`DialectRegistry`]
#[derive(Debug, Clone)]
pub struct ConnectivityTester {
    registry: DialectRegistry,
    policy: RetryPolicy,
    soft_timeout: Duration,
}

impl ConnectivityTester {
    pub fn new(policy: RetryPolicy, soft_timeout: Duration) -> Self {
        Self {
            registry: DialectRegistry::builtin(),
            policy,
            soft_timeout,
        }
    }

    pub fn with_registry(mut self, registry: DialectRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Try to reach `spec`'s database, up to the policy's attempt count
    ///
    /// Returns `false` once every attempt failed; never errors.
    pub async fn test_connectivity(&self, spec: &ConnectionSpec) -> bool {
        let preset = self.registry.resolve(&spec.uri);
        info!(
            database = %spec.name,
            family = ?preset.family,
            "Testing database connectivity"
        );
        if preset.family == DatabaseFamily::Unknown {
            warn!(database = %spec.name, "Unknown database type, using minimal connection configuration");
        }

        let outcome = retry_fixed(&self.policy, "database connectivity test", move |_attempt| {
            self.attempt(spec, preset)
        })
        .await;

        match outcome {
            Ok(()) => {
                info!(database = %spec.name, "Database is accessible");
                true
            },
            Err(e) => {
                error!(
                    database = %spec.name,
                    attempts = e.attempts(),
                    "Database not accessible"
                );
                false
            },
        }
    }

    /// One attempt, bounded by the soft timeout
    async fn attempt(&self, spec: &ConnectionSpec, preset: &ConnectionPreset) -> Result<()> {
        let budget = self.soft_timeout;

        let result = match preset.strategy {
            ProbeStrategy::Sql => {
                let url = dialect::sqlx_url(&spec.uri, preset.family)?;
                probes::sql_round_trip(&url, preset, budget).await
            },
            ProbeStrategy::Statement { header_prefix } => {
                let target = dialect::statement_target(&spec.uri)?;
                probes::statement_round_trip(&target, header_prefix, preset.probe_query, budget)
                    .await
            },
            ProbeStrategy::Tds { default_port } => {
                let target = dialect::tds_target(&spec.uri, default_port)?;
                probes::tds_round_trip(&target, preset.probe_query, preset.connect_timeout, budget)
                    .await
            },
            ProbeStrategy::Socket { default_port } => match dialect::host_port(&spec.uri, default_port) {
                Some((host, port)) => {
                    probes::socket_handshake(&host, port, preset.connect_timeout, budget).await
                },
                None => {
                    warn!(
                        database = %spec.name,
                        "URI names no host and port, cannot verify reachability; assuming reachable"
                    );
                    Ok(())
                },
            },
        };

        result.map_err(|e| {
            SeedError::unreachable(&spec.name, truncate_chars(&e.to_string(), MAX_ERROR_CHARS))
        })
    }
}

#[async_trait]
impl ConnectivityCheck for ConnectivityTester {
    async fn is_reachable(&self, spec: &ConnectionSpec) -> bool {
        self.test_connectivity(spec).await
    }
}
