//! Gone page rendering.

use anyhow::Result;
use serde::Serialize;

use job_prerender::render::render_gone;

use super::GoneArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct GoneReport<'a> {
    path: &'a str,
    status: u16,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Run the gone command.
pub fn run(args: GoneArgs, ctx: &Context) -> Result<()> {
    let site = ctx.site_config()?;
    let analytics = ctx.analytics(site.base_url(), args.no_analytics);
    let doc = render_gone(&args.path, site.base_url(), analytics.as_ref());

    if let Some(path) = args.output.as_deref() {
        ctx.write_output(Some(path), &doc.html)?;
        ctx.output.success(&format!("Wrote {}", path));
    }

    if ctx.output.is_json() {
        ctx.output.json(&GoneReport {
            path: &args.path,
            status: 410,
            bytes: doc.html.len(),
            html: args.output.is_none().then_some(doc.html.as_str()),
        });
    } else if args.output.is_none() {
        ctx.output.body(&doc.html);
    }

    Ok(())
}
