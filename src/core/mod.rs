//! Core types and error handling.
//!
//! Re-exports the error machinery used across all pipeline stages. Most
//! modules return `anyhow::Result` and construct [`EnvlockError`] variants
//! where a strongly-typed failure matters for matching or exit semantics.

pub mod error;

pub use error::{EnvlockError, ErrorContext, user_friendly_error};
