//! API endpoint URL builders

use crate::artifact::ArtifactKind;

/// Login endpoint; also used as the availability probe
pub fn login_url(base_url: &str) -> String {
    format!("{}/api/v1/security/login", base_url)
}

pub fn csrf_token_url(base_url: &str) -> String {
    format!("{}/api/v1/security/csrf_token", base_url)
}

/// Database connection collection
pub fn database_url(base_url: &str) -> String {
    format!("{}/api/v1/database/", base_url)
}

pub fn import_url(base_url: &str, kind: ArtifactKind) -> String {
    format!("{}/api/v1/{}/import", base_url, kind.resource())
}
