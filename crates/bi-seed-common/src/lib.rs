//! bi-seed Common Library
//!
//! Shared plumbing for the bi-seed workspace members.
//!
//! # Overview
//!
//! - **Logging**: tracing subscriber setup driven by `LOG_*` environment variables
//! - **Retry**: fixed-interval retry driver used by every polling stage
//! - **Text**: helpers for keeping logged response bodies readable
//!
//! # Example
//!
//! ```no_run
//! use bi_seed_common::retry::{retry_fixed, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//! let outcome = retry_fixed(&policy, "ping", |_attempt| async { Ok::<_, String>(()) }).await;
//! assert!(outcome.is_ok());
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;
pub mod retry;
pub mod text;

// Re-export commonly used types
pub use retry::{retry_fixed, RetryError, RetryPolicy};
pub use text::truncate_chars;
