//! Observability for edge prerender workloads.
//!
//! This crate provides:
//! - `StructuredLogger` - Per-request structured logging (JSON or human)
//! - `LogSink` - Where log lines go (stderr in production, memory in tests)
//! - `AnalyticsSink` / `PixelAnalytics` - Tracking beacons embedded in pages

mod analytics;
mod logging;

pub use analytics::*;
pub use logging::*;

// Re-export RequestId and TimingContext from edge-core for convenience
pub use edge_core::{RequestId, TimingContext};
