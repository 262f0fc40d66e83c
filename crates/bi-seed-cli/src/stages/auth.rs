//! Login + CSRF handshake

use crate::api::{Session, SupersetClient};
use crate::config::Credentials;
use crate::error::{Result, SeedError};
use bi_seed_common::{retry_fixed, RetryPolicy};
use tracing::{debug, info};

/// Log in and fetch a CSRF token, retrying the whole handshake
///
/// Both steps must succeed within one attempt; a CSRF failure restarts from
/// login. Transport errors and non-200 responses are both retried.
pub async fn authenticate(
    client: &SupersetClient,
    credentials: &Credentials,
    policy: &RetryPolicy,
) -> Result<Session> {
    let outcome = retry_fixed(policy, "authentication", move |attempt| async move {
        info!(attempt, max_attempts = policy.max_attempts, "Authenticating");

        let access_token = client
            .login(&credentials.username, &credentials.password)
            .await?;
        debug!(attempt, "Login accepted, requesting CSRF token");

        let csrf_token = client.csrf_token(&access_token).await?;
        Ok::<_, SeedError>((access_token, csrf_token))
    })
    .await;

    match outcome {
        Ok((access_token, csrf_token)) => {
            info!(username = %credentials.username, "Authenticated, CSRF token obtained");
            Ok(Session::new(client.clone(), access_token, csrf_token))
        },
        Err(e) => Err(SeedError::AuthenticationFailed {
            attempts: e.attempts(),
            last: e.into_last().to_string(),
        }),
    }
}
