//! API request and response types

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/security/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub provider: &'static str,
    pub refresh: bool,
}

impl<'a> LoginRequest<'a> {
    /// Database-backed login with a refresh token
    pub fn db(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            provider: "db",
            refresh: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfTokenResponse {
    pub result: Option<String>,
}

/// Body of `POST /api/v1/database/`
///
/// Every feature flag is switched on so imported dashboards can use async
/// queries, CTAS/CVAS, DML and uploads against the new connection.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseRequest<'a> {
    pub database_name: &'a str,
    pub sqlalchemy_uri: &'a str,
    pub uuid: &'a str,
    pub expose_in_sqllab: bool,
    pub allow_run_async: bool,
    pub allow_ctas: bool,
    pub allow_cvas: bool,
    pub allow_dml: bool,
    pub allow_multi_schema_metadata_fetch: bool,
    pub allow_csv_upload: bool,
    pub allow_file_upload: bool,
}

impl<'a> CreateDatabaseRequest<'a> {
    pub fn permissive(database_name: &'a str, uuid: &'a str, sqlalchemy_uri: &'a str) -> Self {
        Self {
            database_name,
            sqlalchemy_uri,
            uuid,
            expose_in_sqllab: true,
            allow_run_async: true,
            allow_ctas: true,
            allow_cvas: true,
            allow_dml: true,
            allow_multi_schema_metadata_fetch: true,
            allow_csv_upload: true,
            allow_file_upload: true,
        }
    }
}
