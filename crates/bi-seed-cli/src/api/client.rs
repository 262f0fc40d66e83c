//! HTTP API client
//!
//! [`SupersetClient`] is the unauthenticated handle used for probing and
//! login; [`Session`] adds the bearer and CSRF tokens needed for
//! state-changing calls.

use crate::api::{endpoints, types::*};
use crate::artifact::ArtifactFile;
use crate::config::Timeouts;
use crate::connection::ConnectionSpec;
use crate::error::{Result, SeedError};
use bi_seed_common::truncate_chars;
use reqwest::{header, multipart, Client, RequestBuilder, Response, StatusCode};

/// Longest response body kept in errors and logs
pub const MAX_LOGGED_BODY_CHARS: usize = 500;

/// API client bound to one base URL
///
/// The cookie store matters: the CSRF token is tied to the server-side
/// session cookie set during login.
#[derive(Debug, Clone)]
pub struct SupersetClient {
    http: Client,
    base_url: String,
    timeouts: Timeouts,
}

impl SupersetClient {
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("bi-seed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET` the login endpoint and check that it answers
    ///
    /// 200 and 405 both count as healthy: the route exists even though `GET`
    /// is the wrong verb for it. Any other status comes back as
    /// [`SeedError::UnexpectedStatus`] with the truncated body.
    pub async fn check_login_endpoint(&self) -> Result<StatusCode> {
        let response = self
            .http
            .get(endpoints::login_url(&self.base_url))
            .timeout(self.timeouts.probe)
            .send()
            .await?;

        let status = response.status();
        if is_healthy(status) {
            Ok(status)
        } else {
            Err(status_error(response).await)
        }
    }

    /// Exchange credentials for an access token
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .http
            .post(endpoints::login_url(&self.base_url))
            .json(&LoginRequest::db(username, password))
            .timeout(self.timeouts.auth)
            .send()
            .await?;

        let response = expect_status(response, StatusCode::OK).await?;
        let body: LoginResponse = response.json().await?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or(SeedError::MissingField("access_token"))
    }

    /// Fetch a CSRF token using the access token as bearer auth
    pub async fn csrf_token(&self, access_token: &str) -> Result<String> {
        let response = self
            .http
            .get(endpoints::csrf_token_url(&self.base_url))
            .bearer_auth(access_token)
            .timeout(self.timeouts.auth)
            .send()
            .await?;

        let response = expect_status(response, StatusCode::OK).await?;
        let body: CsrfTokenResponse = response.json().await?;

        body.result
            .filter(|token| !token.is_empty())
            .ok_or(SeedError::MissingField("result"))
    }
}

/// Result of a database-connection create call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A connection with that name was already registered
    AlreadyExists,
}

/// Authenticated API context, read-only once built
#[derive(Debug, Clone)]
pub struct Session {
    client: SupersetClient,
    access_token: String,
    csrf_token: String,
}

impl Session {
    pub fn new(client: SupersetClient, access_token: String, csrf_token: String) -> Self {
        Self {
            client,
            access_token,
            csrf_token,
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.access_token)
            .header("X-CSRFToken", &self.csrf_token)
            .header(header::REFERER, self.client.base_url())
    }

    /// Register a database connection
    ///
    /// 201 is [`CreateOutcome::Created`]. A 422 whose body mentions an
    /// existing or duplicate name is [`CreateOutcome::AlreadyExists`]. Any
    /// other status is an error carrying the truncated body.
    pub async fn create_database(&self, spec: &ConnectionSpec) -> Result<CreateOutcome> {
        let request = CreateDatabaseRequest::permissive(&spec.name, &spec.uuid, &spec.uri);

        let response = self
            .authorized(self.client.http.post(endpoints::database_url(self.base_url())))
            .json(&request)
            .timeout(self.client.timeouts.create_database)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(CreateOutcome::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY && is_duplicate_error(&body) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        Err(SeedError::UnexpectedStatus {
            status: status.as_u16(),
            body: truncate_chars(&body, MAX_LOGGED_BODY_CHARS),
        })
    }

    /// Upload one bundle to its kind's import endpoint as multipart `formData`
    pub async fn import_artifact(&self, artifact: &ArtifactFile, overwrite: bool) -> Result<()> {
        let bytes = tokio::fs::read(&artifact.path).await?;

        let part = multipart::Part::bytes(bytes)
            .file_name(artifact.file_name.clone())
            .mime_str("application/zip")?;
        let mut form = multipart::Form::new().part("formData", part);
        if overwrite {
            form = form.text("overwrite", "true");
        }

        let response = self
            .authorized(
                self.client
                    .http
                    .post(endpoints::import_url(self.base_url(), artifact.kind)),
            )
            .multipart(form)
            .timeout(self.client.timeouts.upload)
            .send()
            .await?;

        expect_status(response, StatusCode::OK).await.map(|_| ())
    }
}

/// Pass the response through when it has `expected` status, else turn it into
/// [`SeedError::UnexpectedStatus`] with the truncated body
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    if response.status() == expected {
        return Ok(response);
    }
    Err(status_error(response).await)
}

async fn status_error(response: Response) -> SeedError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SeedError::UnexpectedStatus {
        status,
        body: truncate_chars(&body, MAX_LOGGED_BODY_CHARS),
    }
}

fn is_healthy(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::METHOD_NOT_ALLOWED
}

fn is_duplicate_error(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("already exists") || lowered.contains("duplicate")
}
