//! WASI 0.2 transport, timer and executor.
//!
//! Every wait in this module, including each read of a response body, is a
//! leaf future that registers the pollable it is waiting on before
//! returning `Pending`. [`block_on`] blocks in `wasi:io/poll.poll` until any
//! registered pollable is ready and re-polls the root future, so an
//! outbound request and a timer race fairly on a single thread until the
//! last body byte.
//!
//! A registration is removed when its leaf future is dropped. Pollables are
//! child resources of the stream or response they watch and must be
//! released before their parent.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{poll_fn, LocalBoxFuture};
use wasi::clocks::monotonic_clock;
use wasi::http::outgoing_handler;
use wasi::http::types::{
    Fields, IncomingBody, Method as WasiMethod, OutgoingBody, OutgoingRequest, Scheme,
};
use wasi::io::poll::Pollable;
use wasi::io::streams::StreamError;

use crate::client::FetchError;
use crate::timeout::Timer;
use crate::transport::{HttpRequest, HttpResponse, Transport};

const READ_CHUNK: u64 = 64 * 1024;

thread_local! {
    static WAITING: RefCell<Vec<(u64, Pollable)>> = const { RefCell::new(Vec::new()) };
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// A pollable registered with [`block_on`]; unregistered on drop.
struct Registration(u64);

impl Drop for Registration {
    fn drop(&mut self) {
        let id = self.0;
        WAITING.with(|w| w.borrow_mut().retain(|(entry, _)| *entry != id));
    }
}

fn wait_on(pollable: Pollable) -> Registration {
    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id.wrapping_add(1));
        id
    });
    WAITING.with(|w| w.borrow_mut().push((id, pollable)));
    Registration(id)
}

/// Poll `check` until it is ready, waiting on a fresh `subscribe()`
/// pollable between attempts.
async fn until<T>(mut check: impl FnMut() -> Poll<T>, subscribe: impl Fn() -> Pollable) -> T {
    let mut registration: Option<Registration> = None;
    poll_fn(|_| match check() {
        Poll::Ready(value) => {
            registration = None;
            Poll::Ready(value)
        }
        Poll::Pending => {
            registration = None;
            registration = Some(wait_on(subscribe()));
            Poll::Pending
        }
    })
    .await
}

/// Drive a future to completion on the current thread.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);

    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }

        WAITING.with(|w| {
            let waiting = w.borrow();
            if !waiting.is_empty() {
                let refs: Vec<&Pollable> = waiting.iter().map(|(_, p)| p).collect();
                wasi::io::poll::poll(&refs);
            }
        });
    }
}

/// Timer backed by the WASI monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasiTimer;

impl Timer for WasiTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let deadline = monotonic_clock::now().saturating_add(nanos);

        Box::pin(until(
            move || {
                if monotonic_clock::now() >= deadline {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            },
            move || monotonic_clock::subscribe_instant(deadline),
        ))
    }
}

/// Transport using `wasi:http/outgoing-handler`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasiTransport;

#[async_trait(?Send)]
impl Transport for WasiTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let pending = start(&request)?;

        let response = until(
            || match pending.get() {
                Some(result) => Poll::Ready(result),
                None => Poll::Pending,
            },
            || pending.subscribe(),
        )
        .await
        .map_err(|()| FetchError::Request("response already consumed".to_string()))?
        .map_err(|e| FetchError::Connection(format!("{:?}", e)))?;

        let status = response.status();
        let headers = response
            .headers()
            .entries()
            .into_iter()
            .map(|(name, value)| (name, String::from_utf8_lossy(&value).into_owned()))
            .collect();

        let body = response
            .consume()
            .map_err(|()| FetchError::Request("response body already consumed".to_string()))?;
        let bytes = read_body(&body).await?;
        drop(IncomingBody::finish(body));

        Ok(HttpResponse {
            status,
            headers,
            body: bytes,
        })
    }
}

fn start(
    request: &HttpRequest,
) -> Result<wasi::http::types::FutureIncomingResponse, FetchError> {
    let invalid = |what: &str| FetchError::Request(format!("invalid {} for {}", what, request.url));

    let entries: Vec<(String, Vec<u8>)> = request
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.as_bytes().to_vec()))
        .collect();
    let fields = Fields::from_list(&entries).map_err(|e| FetchError::Request(format!("{:?}", e)))?;

    let outgoing = OutgoingRequest::new(fields);
    let method = match request.method {
        edge_core::Method::Get => WasiMethod::Get,
        edge_core::Method::Head => WasiMethod::Head,
        edge_core::Method::Post => WasiMethod::Post,
        edge_core::Method::Put => WasiMethod::Put,
        edge_core::Method::Delete => WasiMethod::Delete,
        edge_core::Method::Patch => WasiMethod::Patch,
        edge_core::Method::Options => WasiMethod::Options,
        edge_core::Method::Connect => WasiMethod::Connect,
        edge_core::Method::Trace => WasiMethod::Trace,
        edge_core::Method::Other(ref name) => WasiMethod::Other(name.clone()),
    };
    outgoing.set_method(&method).map_err(|()| invalid("method"))?;

    let scheme = match request.url.scheme() {
        "https" => Scheme::Https,
        "http" => Scheme::Http,
        other => Scheme::Other(other.to_string()),
    };
    outgoing.set_scheme(Some(&scheme)).map_err(|()| invalid("scheme"))?;

    let authority = &request.url[url::Position::BeforeHost..url::Position::AfterPort];
    outgoing
        .set_authority(Some(authority))
        .map_err(|()| invalid("authority"))?;

    let path = &request.url[url::Position::BeforePath..url::Position::AfterQuery];
    outgoing
        .set_path_with_query(Some(path))
        .map_err(|()| invalid("path"))?;

    let body = outgoing.body().map_err(|()| invalid("body"))?;
    let pending = outgoing_handler::handle(outgoing, None)
        .map_err(|e| FetchError::Connection(format!("{:?}", e)))?;
    OutgoingBody::finish(body, None).map_err(|e| FetchError::Request(format!("{:?}", e)))?;

    Ok(pending)
}

async fn read_body(body: &IncomingBody) -> Result<Vec<u8>, FetchError> {
    let stream = body
        .stream()
        .map_err(|()| FetchError::Request("body stream already taken".to_string()))?;

    let mut bytes = Vec::new();
    loop {
        let chunk = until(
            || match stream.read(READ_CHUNK) {
                Ok(chunk) if chunk.is_empty() => Poll::Pending,
                Ok(chunk) => Poll::Ready(Ok(Some(chunk))),
                Err(StreamError::Closed) => Poll::Ready(Ok(None)),
                Err(StreamError::LastOperationFailed(e)) => {
                    Poll::Ready(Err(FetchError::Connection(e.to_debug_string())))
                }
            },
            || stream.subscribe(),
        )
        .await?;

        match chunk {
            Some(chunk) => bytes.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(bytes)
}
