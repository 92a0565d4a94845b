//! Public SDK for edge prerender workloads.
//!
//! This crate re-exports the platform crates:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! fn handle(ctx: &RequestContext, config: &SiteConfig) {
//!     let logger = StructuredLogger::new(ctx.request_id.clone())
//!         .with_path(ctx.path.clone());
//!     logger.info("Handling request");
//!
//!     let policy = RouteCachePolicy::public(Duration::from_secs(300));
//!     let headers = CacheHeadersBuilder::new()
//!         .cache_control_from_policy(&policy)
//!         .build();
//!     let title = escape_html("Rust & Go Engineer");
//! }
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_data;
pub use edge_observability;
pub use edge_security;

/// Prelude for convenient imports.
pub mod prelude {
    pub use std::time::Duration;

    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_observability::*;
    pub use edge_security::*;
}
