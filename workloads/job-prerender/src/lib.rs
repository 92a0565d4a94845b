//! Crawler prerendering for job detail pages.
//!
//! Search engine and social crawlers requesting `/job/<slug>` receive a
//! complete HTML document with metadata and schema.org `JobPosting` data,
//! built from the job store. Everyone else passes through to the
//! client-rendered site untouched.
//!
//! The pipeline lives in [`dispatch`]; the remaining modules are its
//! stages:
//! - [`classify`] - crawler detection and path matching
//! - [`tombstones`] - removed paths answered with `410 Gone`
//! - [`store`] / [`resolve`] - job lookup with a fixed deadline
//! - [`render`] - job page, gone page and JSON-LD

pub mod classify;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod resolve;
pub mod store;
pub mod tombstones;

#[cfg(target_arch = "wasm32")]
mod component;

use edge_sdk::edge_core::{RouteConfig, WorkloadManifest};

pub use classify::{classify, classify_request, detect_bot, BotFamily, Classification, Reason};
pub use data::JobRecord;
pub use dispatch::{admit, Admission, Branch, Dispatch, Dispatcher, PrerenderResponse};
pub use error::PrerenderError;
pub use store::{InMemoryStore, JobStore, SupabaseStore};
pub use tombstones::{StaticTombstones, TombstoneSet, TombstoneSource};

/// Workload name used in logs and the manifest.
pub const WORKLOAD_NAME: &str = "job-prerender";

/// The intercepted route: job detail pages, `GET` and `HEAD` only.
pub fn job_route() -> RouteConfig {
    RouteConfig::new("/job/*", "prerender")
}

pub fn manifest() -> WorkloadManifest {
    WorkloadManifest::new(WORKLOAD_NAME, env!("CARGO_PKG_VERSION")).with_route(job_route())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_routes_job_pages() {
        let manifest = manifest();
        assert_eq!(manifest.name, "job-prerender");
        assert!(manifest.route_for("/job/rust-dev").is_some());
        assert!(manifest.route_for("/jobs").is_none());
        assert!(job_route().accepts("HEAD"));
        assert!(!job_route().accepts("POST"));
    }
}
