//! Request context with typed parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::lifecycle::TimingContext;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_SEQ: AtomicU32 = AtomicU32::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:04x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP headers, keyed by lowercase name.
pub type Headers = HashMap<String, String>;

/// HTTP method.
///
/// Methods without a variant of their own are kept verbatim in `Other`, so
/// a request can be forwarded with the method it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
    Other(String),
}

impl Method {
    /// Method name as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Method {
    /// Standard method names are matched exactly; HTTP methods are case
    /// sensitive, so `get` is an extension method.
    fn from(method: &str) -> Self {
        match method {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        Self::from(method.as_str())
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed request context passed to workload handlers.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// HTTP headers.
    pub headers: Headers,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a new request context.
    ///
    /// A query string on `path` is dropped; routing and tombstone matching
    /// only ever see the path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if let Some(idx) = path.find('?') {
            path.truncate(idx);
        }
        Self {
            request_id: RequestId::generate(),
            method,
            path,
            headers: HashMap::new(),
            timing: TimingContext::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Use an existing request ID (e.g. one set by the platform).
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `User-Agent` header, or an empty string when absent.
    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_query_string_dropped() {
        let ctx = RequestContext::new(Method::Get, "/job/rust?utm_source=x");
        assert_eq!(ctx.path, "/job/rust");
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let ctx = RequestContext::new(Method::Get, "/")
            .with_header("User-Agent", "Googlebot/2.1");
        assert_eq!(ctx.header("USER-AGENT"), Some("Googlebot/2.1"));
        assert_eq!(ctx.user_agent(), "Googlebot/2.1");
    }

    #[test]
    fn test_missing_user_agent_is_empty() {
        let ctx = RequestContext::new(Method::Get, "/job/x");
        assert_eq!(ctx.user_agent(), "");
    }

    #[test]
    fn test_method_from_http() {
        assert_eq!(Method::from(&http::Method::HEAD), Method::Head);
        assert_eq!(Method::from(&http::Method::GET).as_str(), "GET");
    }

    #[test]
    fn test_unlisted_methods_are_kept() {
        let trace = Method::from(&http::Method::TRACE);
        assert_eq!(trace, Method::Trace);
        assert_ne!(trace, Method::Get);

        let propfind = http::Method::from_bytes(b"PROPFIND").unwrap();
        let method = Method::from(&propfind);
        assert_eq!(method, Method::Other("PROPFIND".to_string()));
        assert_eq!(method.as_str(), "PROPFIND");
        assert_eq!(Method::from("get"), Method::Other("get".to_string()));
    }
}
