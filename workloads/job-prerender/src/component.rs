//! Spin HTTP entry point.

use std::cell::OnceCell;

use anyhow::Context as _;
use spin_sdk::http_component;
use url::Url;

use edge_sdk::edge_core::{
    EnvVariables, Method, RequestContext, RequestId, SiteConfig, VariableSource,
};
use edge_sdk::edge_data::wasi_runtime::{block_on, WasiTimer, WasiTransport};
use edge_sdk::edge_data::{DependencyTag, FetchClient, HttpRequest};
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_security::ResourceLimits;

use crate::dispatch::{
    admit, Admission, Dispatch, Dispatcher, PrerenderResponse, TEXT_CONTENT_TYPE,
};
use crate::error::PrerenderError;
use crate::store::SupabaseStore;
use crate::tombstones::{CachedTombstones, RemoteTombstones, TombstoneSet};
use crate::WORKLOAD_NAME;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

thread_local! {
    static TOMBSTONES: OnceCell<TombstoneSet> = const { OnceCell::new() };
}

/// Spin application variables, falling back to the process environment.
/// Spin variable names are lowercase, so `SUPABASE_URL` is read as
/// `supabase_url`.
struct SpinVariables;

impl VariableSource for SpinVariables {
    fn get(&self, key: &str) -> Option<String> {
        spin_sdk::variables::get(&key.to_ascii_lowercase())
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| EnvVariables.get(key))
    }
}

type Client = FetchClient<WasiTransport, WasiTimer>;

#[http_component]
fn handle(req: http::Request<Vec<u8>>) -> anyhow::Result<http::Response<Vec<u8>>> {
    let mut ctx = request_context(&req);

    let config = match admit(&ctx, &SpinVariables) {
        Admission::Prerender(config) => config,
        Admission::PassThrough(_) => return forward(&req, &ctx),
        Admission::Misconfigured(err) => {
            logger(&ctx)
                .error_builder("invalid site configuration")
                .field("error", err.to_string())
                .emit();
            let response = PrerenderResponse::from_error(
                &PrerenderError::ConfigurationMissing(err),
                &ctx.request_id,
            );
            return into_http(response);
        }
    };

    let limits = ResourceLimits::default();
    let store = config
        .credentials()
        .map(|credentials| SupabaseStore::new(client(&ctx, &limits), credentials));
    let remote =
        RemoteTombstones::new(client(&ctx, &limits), config.base_url()).with_limits(&limits);

    TOMBSTONES.with(|cache| {
        let dispatcher = Dispatcher::new(
            config,
            store,
            CachedTombstones::new(remote, cache),
            WasiTimer,
        )
        .with_limits(limits.clone());

        match block_on(dispatcher.dispatch(&mut ctx)) {
            Dispatch::Respond(response) => into_http(response),
            Dispatch::PassThrough(_) => block_on(pass_through(
                dispatcher.config().upstream_url(),
                &req,
                &ctx,
                client(&ctx, &limits),
            )),
        }
    })
}

fn client(ctx: &RequestContext, limits: &ResourceLimits) -> Client {
    FetchClient::new(WasiTransport, WasiTimer, ctx.request_id.clone())
        .with_max_body_bytes(limits.max_fetch_response_bytes)
}

/// Forward a request that is not prerendered. Only the upstream origin is
/// read from the configuration.
fn forward(
    req: &http::Request<Vec<u8>>,
    ctx: &RequestContext,
) -> anyhow::Result<http::Response<Vec<u8>>> {
    match SiteConfig::upstream_from_source(&SpinVariables) {
        Ok(upstream) => {
            let client = client(ctx, &ResourceLimits::default());
            block_on(pass_through(upstream.as_ref(), req, ctx, client))
        }
        Err(err) => bad_gateway(ctx, &err.to_string()),
    }
}

fn request_context(req: &http::Request<Vec<u8>>) -> RequestContext {
    let mut ctx = RequestContext::new(Method::from(req.method()), req.uri().path());
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            ctx = ctx.with_header(name.as_str(), value);
        }
    }
    let platform_id = ctx.header("x-request-id").map(RequestId::from_string);
    match platform_id {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

fn logger(ctx: &RequestContext) -> StructuredLogger {
    StructuredLogger::new(ctx.request_id.clone())
        .with_workload(WORKLOAD_NAME)
        .with_path(ctx.path.clone())
}

fn into_http(response: PrerenderResponse) -> anyhow::Result<http::Response<Vec<u8>>> {
    let mut builder = http::Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    Ok(builder.body(response.body.into_bytes())?)
}

/// Forward the request to the client-rendered site.
async fn pass_through(
    upstream: Option<&Url>,
    req: &http::Request<Vec<u8>>,
    ctx: &RequestContext,
    client: Client,
) -> anyhow::Result<http::Response<Vec<u8>>> {
    let Some(upstream) = upstream else {
        return bad_gateway(ctx, "no upstream configured");
    };

    let target = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
    let url = upstream.join(target).context("building upstream URL")?;
    let headers = req
        .headers()
        .iter()
        .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let request = HttpRequest {
        method: ctx.method.clone(),
        url,
        headers,
    };

    match client.send(request, DependencyTag::Upstream).await {
        Ok(response) => {
            let mut builder = http::Response::builder().status(response.status);
            for (name, value) in &response.headers {
                if !HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()) {
                    builder = builder.header(name.as_str(), value.as_str());
                }
            }
            Ok(builder.body(response.body)?)
        }
        Err(err) => bad_gateway(ctx, &err.to_string()),
    }
}

fn bad_gateway(ctx: &RequestContext, reason: &str) -> anyhow::Result<http::Response<Vec<u8>>> {
    logger(ctx)
        .warn_builder("pass-through failed")
        .field("error", reason)
        .emit();

    Ok(http::Response::builder()
        .status(502)
        .header("content-type", TEXT_CONTENT_TYPE)
        .header("x-request-id", ctx.request_id.to_string())
        .body(b"Bad gateway".to_vec())?)
}
