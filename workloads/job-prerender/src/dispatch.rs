//! Request dispatch.
//!
//! Evaluation order, first match wins:
//! 1. not a job page, not a crawler, or not `GET`/`HEAD`: pass through
//! 2. store credentials missing: `500`
//! 3. path tombstoned: `410` with the gone page
//! 4. empty or oversized slug: `404` without a lookup
//! 5. store lookup: `404` / `500` / `408`, or `200` with the job page
//!
//! Tombstone list failures never stop the pipeline. Every response names
//! the branch that produced it in `X-Edge-Function`.

use std::sync::Arc;
use std::time::Duration;

use edge_sdk::edge_cache::{header_names, CacheHeadersBuilder, RouteCachePolicy};
use edge_sdk::edge_core::{
    Clock, ConfigError, LifecyclePhase, RequestContext, RequestId, RouteConfig, SiteConfig,
    SystemClock, TimingContext, VariableSource,
};
use edge_sdk::edge_data::Timer;
use edge_sdk::edge_observability::{
    AnalyticsSink, LogFormat, LogSink, NoAnalytics, PixelAnalytics, StructuredLogger,
};
use edge_sdk::edge_security::ResourceLimits;

use crate::classify::{classify_request, slug_from_path, Classification, Reason};
use crate::error::PrerenderError;
use crate::render::{render_gone, render_job, RenderedDocument};
use crate::resolve::resolve_job_default;
use crate::store::JobStore;
use crate::tombstones::{or_empty, TombstoneSource};
use crate::{job_route, WORKLOAD_NAME};

/// Content type of plain-text responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// How long crawlers and CDNs may keep a job page.
pub const RENDERED_TTL: Duration = Duration::from_secs(300);
/// How long crawlers and CDNs may keep a gone page.
pub const GONE_TTL: Duration = Duration::from_secs(86_400);

/// The terminal state that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    ConfigError,
    Gone,
    NotFound,
    StoreError,
    Timeout,
    Rendered,
    Unexpected,
}

impl Branch {
    /// Branch for a pipeline failure.
    pub fn for_error(err: &PrerenderError) -> Self {
        match err {
            PrerenderError::ConfigurationMissing(_) => Self::ConfigError,
            PrerenderError::NotFound => Self::NotFound,
            PrerenderError::Timeout(_) => Self::Timeout,
            PrerenderError::StoreError(_) => Self::StoreError,
            PrerenderError::TombstoneListUnavailable(_) | PrerenderError::UnexpectedFailure(_) => {
                Self::Unexpected
            }
        }
    }

    pub fn status(self) -> u16 {
        match self {
            Self::Rendered => 200,
            Self::NotFound => 404,
            Self::Timeout => 408,
            Self::Gone => 410,
            Self::ConfigError | Self::StoreError | Self::Unexpected => 500,
        }
    }

    /// Value of the `X-Edge-Function` header.
    pub fn edge_function(self) -> &'static str {
        match self {
            Self::Rendered => "bot-prerender",
            Self::Gone => "bot-prerender-410",
            Self::NotFound => "bot-prerender-404",
            Self::Timeout => "bot-prerender-timeout",
            Self::ConfigError => "bot-prerender-config-error",
            Self::StoreError | Self::Unexpected => "bot-prerender-error",
        }
    }

    /// Cache policy, or `None` to send no `Cache-Control` at all.
    pub fn cache_policy(self) -> Option<RouteCachePolicy> {
        match self {
            Self::Rendered => Some(RouteCachePolicy::public(RENDERED_TTL).vary_on("User-Agent")),
            Self::Gone => Some(RouteCachePolicy::public(GONE_TTL).vary_on("User-Agent")),
            Self::NotFound => None,
            Self::ConfigError | Self::StoreError | Self::Timeout | Self::Unexpected => {
                Some(RouteCachePolicy::none())
            }
        }
    }

    /// Body of plain-text responses.
    pub fn message(self) -> &'static str {
        match self {
            Self::ConfigError => "Configuration error",
            Self::NotFound => "Job not found",
            Self::StoreError => "Database error",
            Self::Timeout => "Request timeout",
            Self::Unexpected => "Internal server error",
            Self::Rendered | Self::Gone => "",
        }
    }
}

/// A response produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerenderResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub branch: Branch,
}

impl PrerenderResponse {
    /// Response carrying a rendered document.
    pub fn document(branch: Branch, doc: RenderedDocument, request_id: &RequestId) -> Self {
        Self::new(branch, doc.content_type, doc.html, request_id)
    }

    /// Plain-text response for a failure.
    pub fn from_error(err: &PrerenderError, request_id: &RequestId) -> Self {
        let branch = Branch::for_error(err);
        Self::new(branch, TEXT_CONTENT_TYPE, branch.message().to_string(), request_id)
    }

    fn new(branch: Branch, content_type: &str, body: String, request_id: &RequestId) -> Self {
        let mut headers = vec![(header_names::CONTENT_TYPE.to_string(), content_type.to_string())];

        if let Some(policy) = branch.cache_policy() {
            headers.extend(
                CacheHeadersBuilder::new()
                    .cache_control_from_policy(&policy)
                    .vary_from_policy(&policy)
                    .build(),
            );
        }

        headers.push((
            header_names::X_EDGE_FUNCTION.to_string(),
            branch.edge_function().to_string(),
        ));
        headers.push((header_names::X_REQUEST_ID.to_string(), request_id.to_string()));

        Self {
            status: branch.status(),
            headers,
            body,
            branch,
        }
    }

    /// Header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Leave the request to the client-rendered site.
    PassThrough(Classification),
    /// Answer with this response.
    Respond(PrerenderResponse),
}

impl Dispatch {
    pub fn response(&self) -> Option<&PrerenderResponse> {
        match self {
            Self::Respond(response) => Some(response),
            Self::PassThrough(_) => None,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough(_))
    }
}

/// What the entry point does with a request before any I/O.
#[derive(Debug)]
pub enum Admission {
    /// Not a crawler request for a job page.
    PassThrough(Classification),
    /// Prerender with this configuration.
    Prerender(SiteConfig),
    /// Would be prerendered, but the site configuration is unusable.
    Misconfigured(ConfigError),
}

/// Classify `ctx` and read the site configuration only for requests that
/// will be prerendered. Pass-through traffic never sees a configuration
/// error.
pub fn admit(ctx: &RequestContext, source: &dyn VariableSource) -> Admission {
    let classification =
        classify_request(ctx.method.as_str(), &ctx.path, ctx.user_agent(), &job_route());
    if !classification.intercept {
        return Admission::PassThrough(classification);
    }

    match SiteConfig::from_source(source) {
        Ok(config) => Admission::Prerender(config),
        Err(err) => Admission::Misconfigured(err),
    }
}

/// The prerender pipeline for one site.
///
/// `store` is the lookup client when the store credentials were present,
/// or the configuration error that prevented building one; requests that
/// need the store are answered with `500` in the latter case.
pub struct Dispatcher<S, T, M> {
    config: SiteConfig,
    route: RouteConfig,
    store: Result<S, ConfigError>,
    tombstones: T,
    timer: M,
    clock: Box<dyn Clock>,
    analytics: Box<dyn AnalyticsSink>,
    limits: ResourceLimits,
    log_sink: Option<Arc<dyn LogSink>>,
    log_format: LogFormat,
}

impl<S: JobStore, T: TombstoneSource, M: Timer> Dispatcher<S, T, M> {
    pub fn new(config: SiteConfig, store: Result<S, ConfigError>, tombstones: T, timer: M) -> Self {
        let analytics: Box<dyn AnalyticsSink> = match PixelAnalytics::new(config.base_url()) {
            Some(pixel) => Box::new(pixel),
            None => Box::new(NoAnalytics),
        };

        Self {
            config,
            route: job_route(),
            store,
            tombstones,
            timer,
            clock: Box::new(SystemClock),
            analytics,
            limits: ResourceLimits::default(),
            log_sink: None,
            log_format: LogFormat::Json,
        }
    }

    /// Clock used for posting-date fallbacks.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_analytics(mut self, analytics: impl AnalyticsSink + 'static) -> Self {
        self.analytics = Box::new(analytics);
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn logger(&self, ctx: &RequestContext) -> StructuredLogger {
        let logger = StructuredLogger::new(ctx.request_id.clone())
            .with_workload(WORKLOAD_NAME)
            .with_path(ctx.path.clone())
            .with_format(self.log_format);
        match &self.log_sink {
            Some(sink) => logger.with_sink(Arc::clone(sink)),
            None => logger,
        }
    }

    /// Decide and, when intercepting, produce the response for `ctx`.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> Dispatch {
        ctx.timing.mark_phase(&LifecyclePhase::Start);
        let logger = self.logger(ctx);
        let path = ctx.path.clone();

        let classification =
            classify_request(ctx.method.as_str(), &path, ctx.user_agent(), &self.route);
        ctx.timing.mark_phase(&LifecyclePhase::Classified(classification.intercept));

        logger
            .info_builder("request received")
            .field("method", ctx.method.as_str())
            .field("user_agent", ctx.user_agent())
            .field("reason", classification.reason.to_string())
            .field_bool("bot", classification.reason == Reason::Bot)
            .field("crawler", classification.signature.map(|s| s.token).unwrap_or_default())
            .emit();

        if !classification.intercept {
            logger.debug("passing through");
            return Dispatch::PassThrough(classification);
        }

        let response = match self.prerender(&mut ctx.timing, &path, &logger).await {
            Ok((branch, doc)) => PrerenderResponse::document(branch, doc, &ctx.request_id),
            Err(err) => {
                log_failure(&logger, &err);
                ctx.timing.mark_phase(&LifecyclePhase::Error(err.to_string()));
                PrerenderResponse::from_error(&err, &ctx.request_id)
            }
        };
        ctx.timing.mark_phase(&LifecyclePhase::Completion(response.status));

        logger
            .info_builder("response sent")
            .field_u64("status", u64::from(response.status))
            .field("edge_function", response.branch.edge_function())
            .duration_ms("duration_ms", ctx.timing.elapsed())
            .emit();

        Dispatch::Respond(response)
    }

    async fn prerender(
        &self,
        timing: &mut TimingContext,
        path: &str,
        logger: &StructuredLogger,
    ) -> Result<(Branch, RenderedDocument), PrerenderError> {
        let store = self
            .store
            .as_ref()
            .map_err(|err| PrerenderError::ConfigurationMissing(err.clone()))?;

        let tombstones = or_empty(self.tombstones.load().await, logger);
        timing.mark_phase(&LifecyclePhase::TombstonesChecked);
        if tombstones.contains(path) {
            logger.info("path is tombstoned");
            let doc = render_gone(path, self.config.base_url(), self.analytics.as_ref());
            return Ok((Branch::Gone, doc));
        }

        let slug = slug_from_path(path, &self.route).ok_or(PrerenderError::NotFound)?;
        if let Err(err) = self.limits.check_slug(slug) {
            logger
                .warn_builder("slug rejected")
                .field("error", err.to_string())
                .emit();
            return Err(PrerenderError::NotFound);
        }

        let started = timing.elapsed();
        let lookup = resolve_job_default(store, &self.timer, slug).await;
        timing.mark_phase(&LifecyclePhase::Resolved);
        logger
            .info_builder("store lookup")
            .field("slug", slug)
            .field(
                "outcome",
                match &lookup {
                    Ok(_) => "found".to_string(),
                    Err(err) => err.to_string(),
                },
            )
            .duration_ms("duration_ms", timing.elapsed().saturating_sub(started))
            .emit();

        let job = lookup?;
        let doc = render_job(
            &job,
            self.config.base_url(),
            self.clock.as_ref(),
            self.analytics.as_ref(),
        )?;
        Ok((Branch::Rendered, doc))
    }
}

fn log_failure(logger: &StructuredLogger, err: &PrerenderError) {
    let builder = match err {
        PrerenderError::NotFound => logger.info_builder("job not found"),
        PrerenderError::Timeout(_) => logger.warn_builder("store lookup timed out"),
        _ => logger.error_builder("prerender failed"),
    };
    builder.field("error", err.to_string()).emit();
}
