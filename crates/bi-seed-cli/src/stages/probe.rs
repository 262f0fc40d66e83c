//! API availability probe

use crate::api::SupersetClient;
use crate::error::{Result, SeedError};
use bi_seed_common::{retry_fixed, RetryPolicy};
use tracing::{error, info};

/// Poll the login endpoint until it answers
///
/// See [`SupersetClient::check_login_endpoint`] for what counts as healthy.
/// Returns `false` once the policy's attempts run out.
pub async fn wait_for_api(client: &SupersetClient, policy: &RetryPolicy) -> bool {
    info!(base_url = client.base_url(), "Checking whether the API is available");

    let outcome = retry_fixed(policy, "API availability probe", move |_attempt| {
        client.check_login_endpoint()
    })
    .await;

    match outcome {
        Ok(status) => {
            info!(status = status.as_u16(), "API is available");
            true
        },
        Err(e) => {
            error!(attempts = e.attempts(), "API not available, giving up");
            false
        },
    }
}

/// [`wait_for_api`] as a fatal check
pub async fn require_api(client: &SupersetClient, policy: &RetryPolicy) -> Result<()> {
    if wait_for_api(client, policy).await {
        Ok(())
    } else {
        Err(SeedError::ApiUnavailable {
            base_url: client.base_url().to_string(),
            attempts: policy.max_attempts,
        })
    }
}
