//! Cache policies and response headers for edge prerender workloads.
//!
//! This crate provides:
//! - `RouteCachePolicy` - Route-level cache configuration
//! - `CacheHeadersBuilder` - `Cache-Control`/`Vary` header composition
//! - `header_names` - Diagnostic header names shared by workloads
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use edge_cache::{CacheHeadersBuilder, RouteCachePolicy};
//!
//! // Prerendered pages may sit in shared caches for five minutes
//! let policy = RouteCachePolicy::public(Duration::from_secs(300));
//! let headers = CacheHeadersBuilder::new()
//!     .cache_control_from_policy(&policy)
//!     .build();
//! ```

mod headers;
mod policy;

pub use headers::*;
pub use policy::*;
