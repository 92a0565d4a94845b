//! Data models for job prerendering.

mod job;

pub use job::*;
