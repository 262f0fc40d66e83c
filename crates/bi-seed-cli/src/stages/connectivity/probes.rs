//! Single reachability attempts, one per probe strategy
//!
//! Every function here owns the connection it opens and releases it before
//! returning, whether the attempt succeeded, failed or ran out of time.

use super::dialect::{ConnectionPreset, StatementTarget, TdsTarget};
use crate::error::{Result, SeedError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sqlx::any::AnyPoolOptions;
use std::time::Duration;
use tiberius::{AuthMethod, Config as TdsConfig, EncryptionLevel};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

/// Open a one-connection pool, run the preset's probe query, close the pool
pub async fn sql_round_trip(url: &str, preset: &ConnectionPreset, budget: Duration) -> Result<()> {
    sqlx::any::install_default_drivers();

    let mut options = AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .max_lifetime(preset.pool_recycle);
    if let Some(timeout) = preset.acquire_timeout() {
        options = options.acquire_timeout(timeout.min(budget));
    }

    // Lazy: nothing is dialled until the query below needs a connection
    let pool = options.connect_lazy(url)?;

    let outcome = tokio::time::timeout(budget, sqlx::query(preset.probe_query).fetch_one(&pool)).await;
    pool.close().await;

    match outcome {
        Ok(Ok(_row)) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(timed_out(budget)),
    }
}

#[derive(Debug, Deserialize)]
struct StatementPage {
    #[serde(rename = "nextUri")]
    next_uri: Option<String>,
    error: Option<StatementError>,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    message: String,
}

/// Submit the probe query over the statement protocol and follow `nextUri`
/// until the coordinator reports the query finished
pub async fn statement_round_trip(
    target: &StatementTarget,
    header_prefix: &str,
    query: &str,
    budget: Duration,
) -> Result<()> {
    // Fresh client per attempt, no idle connections kept afterwards
    let http = Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(budget)
        .build()?;
    let user_header = format!("{header_prefix}-User");

    let run = async {
        let mut submit = http
            .post(format!("{}/v1/statement", target.endpoint))
            .header(user_header.as_str(), target.user.as_str())
            .body(query.to_string());
        if let Some(catalog) = &target.catalog {
            submit = submit.header(format!("{header_prefix}-Catalog"), catalog.as_str());
        }
        if let Some(password) = &target.password {
            submit = submit.basic_auth(&target.user, Some(password));
        }

        let mut page = statement_page(submit.send().await?).await?;
        let mut polls = 0u32;

        loop {
            if let Some(error) = page.error {
                return Err(SeedError::unreachable(&target.endpoint, error.message));
            }
            let Some(next) = page.next_uri else {
                debug!(polls, endpoint = %target.endpoint, "Statement finished");
                return Ok(());
            };

            polls += 1;
            let mut poll = http.get(next).header(user_header.as_str(), target.user.as_str());
            if let Some(password) = &target.password {
                poll = poll.basic_auth(&target.user, Some(password));
            }
            page = statement_page(poll.send().await?).await?;
        }
    };

    match tokio::time::timeout(budget, run).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(budget)),
    }
}

async fn statement_page(response: reqwest::Response) -> Result<StatementPage> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(SeedError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// Log in to SQL Server over TDS, run `query` and close the client
pub async fn tds_round_trip(
    target: &TdsTarget,
    query: &str,
    connect_timeout: Option<Duration>,
    budget: Duration,
) -> Result<()> {
    let mut config = TdsConfig::new();
    config.host(&target.host);
    config.port(target.port);
    config.authentication(AuthMethod::sql_server(&target.user, &target.password));
    config.application_name("bi-seed");
    if let Some(database) = &target.database {
        config.database(database);
    }
    if !target.encrypt {
        config.encryption(EncryptionLevel::NotSupported);
    }
    if target.trust_server_certificate {
        config.trust_cert();
    }

    let connect_limit = connect_timeout.map_or(budget, |t| t.min(budget));

    let run = async {
        let tcp = match tokio::time::timeout(connect_limit, TcpStream::connect(config.get_addr())).await {
            Ok(tcp) => tcp?,
            Err(_) => return Err(timed_out(connect_limit)),
        };
        tcp.set_nodelay(true)?;

        let mut client = tiberius::Client::connect(config, tcp.compat_write()).await?;

        // The stream borrows the client; it is consumed before closing
        let outcome = match client.simple_query(query).await {
            Ok(stream) => stream.into_row().await.map(|_row| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = client.close().await {
            debug!(error = %e, host = %target.host, "Closing TDS client failed");
        }

        outcome.map_err(SeedError::from)
    };

    // A timed-out attempt drops the client, which closes its socket
    match tokio::time::timeout(budget, run).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(budget)),
    }
}

/// Complete a TCP handshake with `host:port`, then hang up
pub async fn socket_handshake(
    host: &str,
    port: u16,
    connect_timeout: Option<Duration>,
    budget: Duration,
) -> Result<()> {
    let limit = connect_timeout.map_or(budget, |t| t.min(budget));

    match tokio::time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(mut stream)) => {
            let _ = stream.shutdown().await;
            Ok(())
        },
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(timed_out(limit)),
    }
}

fn timed_out(limit: Duration) -> SeedError {
    SeedError::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("connection test exceeded {}s timeout", limit.as_secs()),
    ))
}
