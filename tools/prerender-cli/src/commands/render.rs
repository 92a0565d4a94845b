//! Offline job page rendering.

use anyhow::{Context as _, Result};
use serde::Serialize;

use job_prerender::render::{canonical_url, page_title, render_job};
use job_prerender::JobRecord;

use super::RenderArgs;
use crate::context::Context;
use crate::output::format_bytes;

#[derive(Debug, Serialize)]
struct RenderReport {
    slug: String,
    title: String,
    canonical: String,
    content_type: String,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
}

/// Run the render command.
pub fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let text = ctx.read_input(&args.job)?;
    let job: JobRecord = serde_json::from_str(&text).context("Invalid job record")?;

    let site = ctx.site_config()?;
    let analytics = ctx.analytics(site.base_url(), args.no_analytics);
    let doc = render_job(&job, site.base_url(), ctx.clock().as_ref(), analytics.as_ref())
        .context("Rendering failed")?;

    ctx.output.debug(&format!("Title: {}", page_title(&job)));
    ctx.output.debug(&format!("Canonical: {}", canonical_url(site.base_url(), &job.slug)));

    if let Some(path) = args.output.as_deref() {
        ctx.write_output(Some(path), &doc.html)?;
        ctx.output
            .success(&format!("Wrote {} ({})", path, format_bytes(doc.html.len())));
    }

    if ctx.output.is_json() {
        ctx.output.json(&RenderReport {
            canonical: canonical_url(site.base_url(), &job.slug),
            title: page_title(&job),
            slug: job.slug,
            content_type: doc.content_type.to_string(),
            bytes: doc.html.len(),
            html: args.output.is_none().then_some(doc.html),
        });
    } else if args.output.is_none() {
        ctx.output.body(&doc.html);
    }

    Ok(())
}
