//! API client module
//!
//! HTTP client for the BI application's REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{CreateOutcome, Session, SupersetClient};
pub use types::*;
