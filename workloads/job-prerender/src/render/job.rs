//! Job detail page for crawlers.

use edge_sdk::edge_core::Clock;
use edge_sdk::edge_observability::{AnalyticsEvent, AnalyticsSink};
use edge_sdk::edge_security::{escape_attr, escape_html, is_safe_link, strip_tags, TagAllowlist};

use crate::data::JobRecord;
use crate::render::{JobPosting, RenderError, RenderedDocument, SITE_NAME};

/// Characters of description kept in meta tags.
pub const META_DESCRIPTION_CHARS: usize = 155;

/// `<title> | Job Board`.
pub fn page_title(job: &JobRecord) -> String {
    format!("{} | {}", job.title, SITE_NAME)
}

/// Plain-text summary for meta tags: the first 155 characters of the
/// description's text followed by `...`, or a sentence built from the title.
pub fn meta_description(job: &JobRecord) -> String {
    match job.description().map(strip_tags).filter(|text| !text.is_empty()) {
        Some(text) => {
            let summary: String = text.chars().take(META_DESCRIPTION_CHARS).collect();
            format!("{}...", summary)
        }
        None => format!("{} position available. Apply now!", job.title),
    }
}

/// Canonical URL of a job page.
pub fn canonical_url(base_url: &str, slug: &str) -> String {
    format!("{}/job/{}", base_url.trim_end_matches('/'), slug)
}

/// Render the job page.
///
/// Plain fields are escaped and rich-text fields sanitized. `clock` only
/// fills in missing posting dates, so output is identical for identical
/// inputs and time.
pub fn render_job(
    job: &JobRecord,
    base_url: &str,
    clock: &dyn Clock,
    analytics: &dyn AnalyticsSink,
) -> Result<RenderedDocument, RenderError> {
    let base_url = base_url.trim_end_matches('/');
    let structured = JobPosting::for_job(job, base_url, clock.now()).to_script_json()?;

    let allowlist = TagAllowlist::rich_text();
    let title = escape_attr(&page_title(job));
    let description = escape_attr(&meta_description(job));
    let canonical = escape_attr(&canonical_url(base_url, &job.slug));

    let job_type = job
        .job_type()
        .map(|t| format!("\n                    <p><strong>Type:</strong> {}</p>", escape_html(t)))
        .unwrap_or_default();

    let body = job
        .description()
        .map(|d| allowlist.sanitize(d))
        .unwrap_or_else(|| "No description available.".to_string());

    let requirements = job
        .requirements()
        .map(|r| {
            format!(
                r#"
            <section class="job-requirements">
                <h2>Requirements</h2>
                <div>{}</div>
            </section>
"#,
                allowlist.sanitize(r)
            )
        })
        .unwrap_or_default();

    let apply_link = job
        .application_url()
        .filter(|url| is_safe_link(url))
        .map(|url| {
            format!(
                "\n                <a href=\"{}\" target=\"_blank\" rel=\"noopener\">Apply Now</a>",
                escape_attr(url.trim())
            )
        })
        .unwrap_or_default();

    let pixel = analytics
        .beacon(&AnalyticsEvent::Prerendered {
            slug: job.slug.clone(),
        })
        .map(|markup| format!("\n    <!-- Bot tracking pixel -->\n    {}\n", markup))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:type" content="website">
    <meta property="og:url" content="{canonical}">
    <meta name="twitter:card" content="summary_large_image">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{description}">
    <link rel="canonical" href="{canonical}">
    <script type="application/ld+json">{structured}</script>
</head>
<body>
    <main>
        <article>
            <header>
                <h1>{heading}</h1>
                <div class="job-meta">
                    <p><strong>Company:</strong> {company}</p>
                    <p><strong>Location:</strong> {location}</p>
                    <p><strong>Salary:</strong> {salary}</p>{job_type}
                </div>
            </header>

            <section class="job-description">
                <h2>Job Description</h2>
                <div>{body}</div>
            </section>
{requirements}
            <section class="application">
                <h2>How to Apply</h2>
                <p>This position is available for applications. Visit our main site to apply.</p>{apply_link}
            </section>
        </article>
    </main>
{pixel}</body>
</html>"#,
        heading = escape_html(&job.title),
        company = escape_html(job.company_name()),
        location = escape_html(job.location_label()),
        salary = escape_html(&job.salary_label()),
    );

    Ok(RenderedDocument::html(html))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{Number, Value};

    use edge_sdk::edge_core::FixedClock;
    use edge_sdk::edge_observability::{NoAnalytics, PixelAnalytics};

    use super::*;

    const BASE: &str = "https://seo-vacancy.eu";

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn pixel() -> PixelAnalytics {
        PixelAnalytics::new(BASE).unwrap()
    }

    fn seo_job() -> JobRecord {
        JobRecord {
            company_name: Some("Acme Search".into()),
            location: Some("Amsterdam".into()),
            job_type: Some("FULL_TIME".into()),
            salary_min: Some(Number::from(40_000)),
            salary_max: Some(Number::from(60_000)),
            description: Some("<p>Own our <strong>technical SEO</strong>.</p>".into()),
            requirements: Some("<ul><li>5 years SEO</li></ul>".into()),
            application_url: Some("https://acme.example/apply".into()),
            ..JobRecord::new("senior-seo-specialist", "Senior SEO Specialist")
        }
    }

    fn render(job: &JobRecord) -> String {
        render_job(job, BASE, &clock(), &pixel()).unwrap().html
    }

    fn json_ld(html: &str) -> Value {
        let start = html.find(r#"<script type="application/ld+json">"#).unwrap()
            + r#"<script type="application/ld+json">"#.len();
        let end = start + html[start..].find("</script>").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_head_metadata() {
        let html = render(&seo_job());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Senior SEO Specialist | Job Board</title>"));
        assert!(html.contains(r#"<link rel="canonical" href="https://seo-vacancy.eu/job/senior-seo-specialist">"#));
        assert!(html.contains(r#"<meta property="og:url" content="https://seo-vacancy.eu/job/senior-seo-specialist">"#));
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
        assert!(html.contains(r#"<meta name="description" content="Own our technical SEO ....">"#));
    }

    #[test]
    fn test_structured_data_title_matches_record() {
        let job = seo_job();
        let value = json_ld(&render(&job));
        assert_eq!(value["@type"], "JobPosting");
        assert_eq!(value["title"], job.title);
    }

    #[test]
    fn test_body_sections() {
        let html = render(&seo_job());
        assert!(html.contains("<h1>Senior SEO Specialist</h1>"));
        assert!(html.contains("<p><strong>Company:</strong> Acme Search</p>"));
        assert!(html.contains("<p><strong>Location:</strong> Amsterdam</p>"));
        assert!(html.contains("<p><strong>Salary:</strong> €40,000 - €60,000</p>"));
        assert!(html.contains("<p><strong>Type:</strong> FULL_TIME</p>"));
        assert!(html.contains("<div><p>Own our <strong>technical SEO</strong>.</p></div>"));
        assert!(html.contains("<h2>Requirements</h2>"));
        assert!(html.contains(
            r#"<a href="https://acme.example/apply" target="_blank" rel="noopener">Apply Now</a>"#
        ));
        assert!(html.contains(
            r#"<img src="https://seo-vacancy.eu/api/track?job=senior-seo-specialist&amp;bot=true&amp;prerendered=true""#
        ));
    }

    #[test]
    fn test_minimal_job() {
        let job = JobRecord {
            salary_min: Some(Number::from(40_000)),
            ..JobRecord::new("rust-dev", "Rust Developer")
        };
        let html = render_job(&job, BASE, &clock(), &NoAnalytics).unwrap().html;

        assert!(html.contains("Competitive salary"));
        assert!(html.contains("<div>No description available.</div>"));
        assert!(html.contains(
            r#"<meta name="description" content="Rust Developer position available. Apply now!">"#
        ));
        assert!(!html.contains("Requirements"));
        assert!(!html.contains("Apply Now"));
        assert!(!html.contains("Type:"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_meta_description_truncates_chars() {
        let mut job = JobRecord::new("x", "X");
        job.description = Some(format!("<p>{}</p>", "é".repeat(200)));
        let meta = meta_description(&job);
        assert_eq!(meta.chars().count(), META_DESCRIPTION_CHARS + 3);
        assert!(meta.ends_with("..."));
    }

    #[test]
    fn test_fields_are_escaped() {
        let job = JobRecord {
            company_name: Some("<b>Evil</b> & Co".into()),
            description: Some(r#"<p onclick="x()">Hi</p><script>steal()</script>"#.into()),
            application_url: Some("javascript:alert(1)".into()),
            ..JobRecord::new("x", r#""><script>alert(1)</script>"#)
        };
        let html = render(&job);

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(!html.contains("steal()"));
        assert!(!html.contains("onclick"));
        assert!(!html.contains("javascript:"));
        assert!(html.contains("&lt;b&gt;Evil&lt;/b&gt; &amp; Co"));
        assert!(html.contains("<title>&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt; | Job Board</title>"));
        assert_eq!(json_ld(&html)["title"], job.title);
    }

    #[test]
    fn test_output_is_deterministic() {
        let job = seo_job();
        assert_eq!(render(&job), render(&job));

        let minimal = JobRecord::new("rust-dev", "Rust Developer");
        assert_eq!(render(&minimal), render(&minimal));
        assert_eq!(json_ld(&render(&minimal))["datePosted"], "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_trailing_slash_base() {
        let html = render_job(&seo_job(), "https://seo-vacancy.eu/", &clock(), &NoAnalytics)
            .unwrap()
            .html;
        assert!(html.contains(r#"href="https://seo-vacancy.eu/job/senior-seo-specialist""#));
    }
}
