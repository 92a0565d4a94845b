//! Markup hardening and resource limits for edge prerender workloads.
//!
//! This crate provides:
//! - `escape_html` / `escape_attr` - Escaping for text and attribute contexts
//! - `script_json` - JSON safe to embed inside a `<script>` element
//! - `TagAllowlist` - Rich-text sanitizer keeping a restricted set of tags
//! - `ResourceLimits` - Caps on fetched bodies, list sizes and slugs
//!
//! # Example
//!
//! ```ignore
//! use edge_security::{escape_html, TagAllowlist};
//!
//! let title = escape_html("Rust & Go <Engineer>");
//! let body = TagAllowlist::rich_text().sanitize("<p>Hi</p><script>x()</script>");
//! assert_eq!(body, "<p>Hi</p>");
//! ```

mod limits;
mod sanitize;

pub use limits::*;
pub use sanitize::*;
