//! Fire-and-forget analytics beacons embedded in rendered pages.
//!
//! The edge never calls the analytics endpoint itself. A sink turns an
//! event into markup (a 1x1 image) that the crawler may or may not fetch,
//! so analytics can never delay or fail a response.

use edge_security::escape_attr;
use url::Url;

/// A page view worth counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    /// A job page was prerendered for a crawler.
    Prerendered { slug: String },
    /// A crawler hit a removed page.
    Gone { path: String },
}

/// Turns analytics events into embeddable markup.
pub trait AnalyticsSink {
    /// Markup to embed in the page, or `None` to embed nothing.
    fn beacon(&self, event: &AnalyticsEvent) -> Option<String>;
}

impl<A: AnalyticsSink + ?Sized> AnalyticsSink for &A {
    fn beacon(&self, event: &AnalyticsEvent) -> Option<String> {
        (**self).beacon(event)
    }
}

impl<A: AnalyticsSink + ?Sized> AnalyticsSink for Box<A> {
    fn beacon(&self, event: &AnalyticsEvent) -> Option<String> {
        (**self).beacon(event)
    }
}

/// Tracking pixel pointing at `<base>/api/track`.
#[derive(Debug, Clone)]
pub struct PixelAnalytics {
    endpoint: Url,
}

impl PixelAnalytics {
    /// Pixel for a site URL; `api/track` is appended to any path it has.
    /// Returns `None` if the URL cannot carry a path.
    pub fn new(base_url: &str) -> Option<Self> {
        let mut endpoint = Url::parse(base_url).ok()?;
        endpoint
            .path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "track"]);
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        Some(Self { endpoint })
    }

    /// Tracking URL for an event.
    pub fn url_for(&self, event: &AnalyticsEvent) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            match event {
                AnalyticsEvent::Prerendered { slug } => {
                    query
                        .append_pair("job", slug)
                        .append_pair("bot", "true")
                        .append_pair("prerendered", "true");
                }
                AnalyticsEvent::Gone { path } => {
                    query
                        .append_pair("path", path)
                        .append_pair("status", "410")
                        .append_pair("bot", "true");
                }
            }
        }
        url
    }
}

impl AnalyticsSink for PixelAnalytics {
    fn beacon(&self, event: &AnalyticsEvent) -> Option<String> {
        Some(format!(
            r#"<img src="{}" width="1" height="1" style="display:none;" alt="">"#,
            escape_attr(self.url_for(event).as_str())
        ))
    }
}

/// Embeds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalytics;

impl AnalyticsSink for NoAnalytics {
    fn beacon(&self, _event: &AnalyticsEvent) -> Option<String> {
        None
    }
}
