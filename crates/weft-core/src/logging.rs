#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! Re-exports of tracing macros when the `tracing` feature is enabled.
//! Call sites in this workspace gate themselves with
//! `#[cfg(feature = "tracing")]`, so no no-op mirror is needed when the
//! feature is off.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};
