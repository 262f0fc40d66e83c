//! Database connection specs
//!
//! A spec is written `Name:UUID:ConnectionURI`. Only the first two colons are
//! delimiters; everything after the second colon is the URI verbatim, since
//! URIs carry colons of their own (`postgresql://user:pw@host:5432/db`).

use crate::error::{Result, SeedError};
use std::fmt;

/// A raw spec together with where it came from (env var name or CLI flag)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub source: String,
    pub raw: String,
}

impl ConnectionEntry {
    pub fn new(source: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            raw: raw.into(),
        }
    }

    pub fn parse(&self) -> Result<ConnectionSpec> {
        ConnectionSpec::parse(&self.raw)
    }
}

/// Parsed connection spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub name: String,
    pub uuid: String,
    pub uri: String,
}

impl ConnectionSpec {
    /// Split a `Name:UUID:URI` string
    ///
    /// Fails with [`SeedError::InvalidConnectionSpec`] when fewer than two
    /// colons are present.
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, rest) = raw
            .split_once(':')
            .ok_or_else(|| SeedError::InvalidConnectionSpec(raw.to_string()))?;
        let (uuid, uri) = rest
            .split_once(':')
            .ok_or_else(|| SeedError::InvalidConnectionSpec(raw.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            uuid: uuid.to_string(),
            uri: uri.to_string(),
        })
    }

    /// URI with the password replaced, for logs
    pub fn redacted_uri(&self) -> String {
        match url::Url::parse(&self.uri) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("***"));
                parsed.to_string()
            },
            _ => self.uri.clone(),
        }
    }
}

impl fmt::Display for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uuid)
    }
}
