//! Core abstractions for edge prerender workloads.
//!
//! This crate provides the fundamental types and traits:
//! - `WorkloadManifest` - Workload name, version and routes
//! - `SiteConfig` - Store credentials and site origin, loaded once per process
//! - `RequestContext` - Typed view of the inbound request
//! - `LifecyclePhase` - Request lifecycle tracking
//! - `Clock` - Injectable wall clock for deterministic rendering

mod clock;
mod config;
mod context;
mod lifecycle;
mod workload;

pub use clock::*;
pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use workload::*;
