//! Pipeline stages
//!
//! One module per stage, run top to bottom by [`crate::pipeline`]:
//! probe, authenticate, (production) connectivity check, register, import.

pub mod auth;
pub mod connectivity;
pub mod import;
pub mod probe;
pub mod register;
