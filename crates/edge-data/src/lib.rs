//! Outbound data access with dependency tagging and timeouts.
//!
//! This crate provides:
//! - `Transport` - The HTTP seam; WASI on the edge, scripted in tests
//! - `FetchClient` - Platform fetch with per-dependency timeouts and body limits
//! - `DependencyTag` - Semantic dependency categories
//! - `Timer` / `with_timeout` - First-settled race between a future and a timer
//!
//! Nothing here retries. Edge lookups are request-scoped and latency-bounded;
//! a failed dependency is reported to the caller as-is.

mod client;
mod dependency;
mod timeout;
mod transport;
#[cfg(target_arch = "wasm32")]
pub mod wasi_runtime;

pub use client::*;
pub use dependency::*;
pub use timeout::*;
pub use transport::*;
