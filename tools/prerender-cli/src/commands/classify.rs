//! Request classification.

use anyhow::Result;
use serde::Serialize;

use job_prerender::classify::slug_from_path;
use job_prerender::{classify_request, job_route};

use super::ClassifyArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct ClassifyReport<'a> {
    path: &'a str,
    user_agent: &'a str,
    intercept: bool,
    reason: String,
    slug: Option<&'a str>,
    crawler: Option<&'static str>,
    family: Option<&'static str>,
}

/// Run the classify command.
pub fn run(args: ClassifyArgs, ctx: &Context) -> Result<()> {
    let route = job_route();
    let method = args.method.to_ascii_uppercase();
    let classification = classify_request(&method, &args.path, &args.user_agent, &route);

    let report = ClassifyReport {
        path: &args.path,
        user_agent: &args.user_agent,
        intercept: classification.intercept,
        reason: classification.reason.to_string(),
        slug: slug_from_path(&args.path, &route),
        crawler: classification.signature.map(|s| s.token),
        family: classification.signature.map(|s| s.family.as_str()),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header("Classification");
    ctx.output.kv("Path", report.path);
    ctx.output.kv("User agent", report.user_agent);
    ctx.output.kv("Reason", &report.reason);
    if let Some(slug) = report.slug {
        ctx.output.kv("Slug", slug);
    }
    if let (Some(crawler), Some(family)) = (report.crawler, report.family) {
        ctx.output.kv("Crawler", &format!("{} ({})", crawler, family));
    }

    if report.intercept {
        ctx.output.success("Prerendered for crawlers");
    } else {
        ctx.output.info("Passed through to the site");
    }

    Ok(())
}
