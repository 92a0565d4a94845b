//! "No longer available" page for tombstoned paths.

use edge_sdk::edge_observability::{AnalyticsEvent, AnalyticsSink};
use edge_sdk::edge_security::escape_attr;

use crate::render::{RenderedDocument, SITE_NAME};

/// Render the gone page for `path`. Crawlers are told not to index it.
pub fn render_gone(path: &str, base_url: &str, analytics: &dyn AnalyticsSink) -> RenderedDocument {
    let home = escape_attr(base_url.trim_end_matches('/'));
    let pixel = analytics
        .beacon(&AnalyticsEvent::Gone {
            path: path.to_string(),
        })
        .map(|markup| format!("\n    <!-- Bot tracking pixel -->\n    {}\n", markup))
        .unwrap_or_default();

    RenderedDocument::html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Job No Longer Available | {SITE_NAME}</title>
    <meta name="description" content="This job posting is no longer available. Browse our current job openings.">
    <meta name="robots" content="noindex">
</head>
<body>
    <main>
        <h1>Job No Longer Available</h1>
        <p>This job posting has been removed or has expired.</p>
        <p><a href="{home}">Browse current job openings</a></p>
    </main>
{pixel}</body>
</html>"#
    ))
}

#[cfg(test)]
mod tests {
    use edge_sdk::edge_observability::{NoAnalytics, PixelAnalytics};

    use super::*;

    #[test]
    fn test_gone_page() {
        let pixel = PixelAnalytics::new("https://seo-vacancy.eu").unwrap();
        let doc = render_gone("/job/old-role", "https://seo-vacancy.eu", &pixel);

        assert_eq!(doc.content_type, "text/html; charset=utf-8");
        assert!(doc.html.contains("<title>Job No Longer Available | Job Board</title>"));
        assert!(doc.html.contains(r#"<meta name="robots" content="noindex">"#));
        assert!(doc.html.contains(r#"<a href="https://seo-vacancy.eu">Browse current job openings</a>"#));
        assert!(doc.html.contains(
            r#"src="https://seo-vacancy.eu/api/track?path=%2Fjob%2Fold-role&amp;status=410&amp;bot=true""#
        ));
    }

    #[test]
    fn test_path_cannot_inject_markup() {
        let pixel = PixelAnalytics::new("https://seo-vacancy.eu").unwrap();
        let doc = render_gone(r#"/job/"><script>x</script>"#, "https://seo-vacancy.eu", &pixel);
        assert!(!doc.html.contains("<script>"));
    }

    #[test]
    fn test_without_analytics() {
        let doc = render_gone("/job/old-role", "https://seo-vacancy.eu/", &NoAnalytics);
        assert!(!doc.html.contains("<img"));
        assert!(doc.html.contains(r#"href="https://seo-vacancy.eu""#));
        assert_eq!(doc, render_gone("/job/old-role", "https://seo-vacancy.eu/", &NoAnalytics));
    }
}
