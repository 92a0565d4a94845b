//! Full pipeline runs against local fixtures.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use serde::Serialize;

use edge_core::{ConfigError, Method, RequestContext};
use edge_data::TokioTimer;
use edge_observability::{LogEntry, LogFormat, MemorySink};
use job_prerender::store::StoreFailure;
use job_prerender::{
    Dispatch, Dispatcher, InMemoryStore, JobRecord, JobStore, StaticTombstones, TombstoneSet,
};

use super::SimulateArgs;
use crate::context::Context;
use crate::output::status_badge;

/// In-memory store that answers after a fixed delay.
struct FixtureStore {
    jobs: InMemoryStore,
    delay: Duration,
}

#[async_trait(?Send)]
impl JobStore for FixtureStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.jobs.find_by_slug(slug).await
    }
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    outcome: &'static str,
    reason: Option<String>,
    status: Option<u16>,
    edge_function: Option<&'static str>,
    headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    logs: Vec<LogEntry>,
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let site = ctx.site_config()?;

    let store = if args.no_store {
        Err(ConfigError::Missing("SUPABASE_URL"))
    } else {
        Ok(FixtureStore {
            jobs: load_jobs(args.jobs.as_deref(), ctx)?,
            delay: Duration::from_millis(args.delay_ms.unwrap_or(0)),
        })
    };

    let limits = ctx.limits()?;
    let tombstones = match args.tombstones.as_deref() {
        Some(path) => TombstoneSet::parse(&ctx.read_input(path)?, limits.max_tombstone_entries),
        None => TombstoneSet::empty(),
    };

    let sink = MemorySink::new();
    let analytics = ctx.analytics(site.base_url(), false);
    let dispatcher = Dispatcher::new(site, store, StaticTombstones(tombstones), TokioTimer)
        .with_clock(ctx.clock())
        .with_analytics(analytics)
        .with_limits(limits)
        .with_log_sink(Arc::new(sink.clone()))
        .with_log_format(LogFormat::Human);

    let mut request = RequestContext::new(parse_method(&args.method)?, args.path.as_str())
        .with_header("user-agent", args.user_agent.as_str());
    let dispatch = dispatcher.dispatch(&mut request).await;

    let report = match &dispatch {
        Dispatch::PassThrough(classification) => SimulateReport {
            outcome: "pass-through",
            reason: Some(classification.reason.to_string()),
            status: None,
            edge_function: None,
            headers: Vec::new(),
            body: None,
            logs: sink.entries(),
        },
        Dispatch::Respond(response) => SimulateReport {
            outcome: "respond",
            reason: None,
            status: Some(response.status),
            edge_function: Some(response.branch.edge_function()),
            headers: response.headers.clone(),
            body: args.body.then(|| response.body.clone()),
            logs: sink.entries(),
        },
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    for entry in &report.logs {
        ctx.output.debug(&entry.to_human());
    }

    ctx.output.header("Dispatch");
    ctx.output.kv("Request", &format!("{} {}", args.method.to_uppercase(), args.path));
    match (&report.reason, report.status) {
        (Some(reason), _) => ctx.output.info(&format!("Passed through ({})", reason)),
        (None, Some(status)) => {
            ctx.output.kv("Status", &status_badge(status));
            for (name, value) in &report.headers {
                ctx.output.kv(name, value);
            }
        }
        (None, None) => {}
    }

    if let Some(body) = &report.body {
        ctx.output.body(body);
    }

    Ok(())
}

fn load_jobs(path: Option<&str>, ctx: &Context) -> Result<InMemoryStore> {
    let Some(path) = path else {
        return Ok(InMemoryStore::new());
    };

    let jobs: Vec<JobRecord> = serde_json::from_str(&ctx.read_input(path)?)
        .with_context(|| format!("Invalid job fixtures in {}", path))?;
    ctx.output.debug(&format!("Loaded {} jobs", jobs.len()));

    Ok(jobs.into_iter().fold(InMemoryStore::new(), InMemoryStore::with_job))
}

/// Methods are upper-cased for convenience; any token is accepted.
fn parse_method(method: &str) -> Result<Method> {
    let method = method.trim();
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        bail!("Invalid method: {:?}", method);
    }
    Ok(Method::from(method.to_ascii_uppercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::Get);
        assert_eq!(parse_method("HEAD").unwrap(), Method::Head);
        assert_eq!(parse_method("trace").unwrap(), Method::Trace);
        assert_eq!(
            parse_method("propfind").unwrap(),
            Method::Other("PROPFIND".to_string())
        );
        assert!(parse_method("").is_err());
        assert!(parse_method("GE T").is_err());
    }

    #[tokio::test]
    async fn test_fixture_store_delegates() {
        let store = FixtureStore {
            jobs: InMemoryStore::new().with_job(JobRecord::new("rust-dev", "Rust Developer")),
            delay: Duration::ZERO,
        };
        assert!(store.find_by_slug("rust-dev").await.unwrap().is_some());
        assert!(store.find_by_slug("missing").await.unwrap().is_none());
    }
}
