//! Job store access.
//!
//! The pipeline needs one operation from the store: fetch at most one job
//! whose slug equals a value. [`SupabaseStore`] does that against the
//! PostgREST API; [`InMemoryStore`] backs local tools and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use edge_sdk::edge_core::StoreCredentials;
use edge_sdk::edge_data::{DependencyTag, FetchClient, FetchPolicy, HttpRequest, Timer, Transport};

use crate::data::JobRecord;

/// PostgREST code for "single object requested, zero (or many) rows found".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Media type asking PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// An error reported by the store, in PostgREST's shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct StoreFailure {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl StoreFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether the store is saying "no matching row" rather than failing.
    pub fn is_no_rows(&self) -> bool {
        self.code.as_deref() == Some(NO_ROWS_CODE)
            || [self.message.as_str(), self.details.as_deref().unwrap_or_default()]
                .iter()
                .any(|text| text.contains("No rows") || text.contains("0 rows"))
    }
}

/// Lookup-by-slug contract.
#[async_trait(?Send)]
pub trait JobStore {
    /// At most one job with this slug. `Ok(None)` is a defined not-found.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure>;
}

#[async_trait(?Send)]
impl<S: JobStore + ?Sized> JobStore for &S {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure> {
        (**self).find_by_slug(slug).await
    }
}

/// A 2xx body: one object, or an array when the server ignored `Accept`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Rows {
    One(JobRecord),
    Many(Vec<JobRecord>),
}

/// Supabase (PostgREST) `jobs` table client.
pub struct SupabaseStore<T, M> {
    client: FetchClient<T, M>,
    credentials: StoreCredentials,
}

impl<T: Transport, M: Timer> SupabaseStore<T, M> {
    pub fn new(client: FetchClient<T, M>, credentials: StoreCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// `<store>/rest/v1/jobs?select=*&slug=eq.<slug>`.
    pub fn lookup_url(&self, slug: &str) -> Result<Url, StoreFailure> {
        let mut url = self.credentials.url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreFailure::new(format!("store URL cannot be a base: {}", self.credentials.url))
            })?
            .pop_if_empty()
            .extend(["rest", "v1", "jobs"]);
        url.query_pairs_mut()
            .clear()
            .append_pair("select", "*")
            .append_pair("slug", &format!("eq.{}", slug));
        Ok(url)
    }
}

#[async_trait(?Send)]
impl<T: Transport, M: Timer> JobStore for SupabaseStore<T, M> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure> {
        let key = &self.credentials.key;
        let request = HttpRequest::get(self.lookup_url(slug)?)
            .header("apikey", key.as_str())
            .header("Authorization", format!("Bearer {}", key))
            .header("Accept", SINGLE_OBJECT);

        // The caller races this lookup against its own deadline.
        let response = self
            .client
            .send_with_policy(request, DependencyTag::Store, FetchPolicy::unbounded())
            .await
            .map_err(|e| StoreFailure::new(e.to_string()))?;

        let body = response
            .text()
            .map_err(|e| StoreFailure::new(e.to_string()))?
            .trim();

        if !response.is_success() {
            return Err(match serde_json::from_str::<StoreFailure>(body) {
                Ok(failure) if failure.code.is_some() || !failure.message.is_empty() => failure,
                _ => StoreFailure::new(format!("store responded with HTTP {}", response.status)),
            });
        }

        if body.is_empty() || body == "null" {
            return Ok(None);
        }

        match serde_json::from_str::<Rows>(body) {
            Ok(Rows::One(job)) => Ok(Some(job)),
            Ok(Rows::Many(jobs)) => Ok(jobs.into_iter().next()),
            Err(e) => Err(StoreFailure::new(format!("malformed job row: {}", e))),
        }
    }
}

/// Jobs held in memory, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    jobs: HashMap<String, JobRecord>,
    failure: Option<StoreFailure>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(mut self, job: JobRecord) -> Self {
        self.jobs.insert(job.slug.clone(), job);
        self
    }

    /// Fail every lookup with `failure`.
    pub fn failing(failure: StoreFailure) -> Self {
        Self {
            jobs: HashMap::new(),
            failure: Some(failure),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait(?Send)]
impl JobStore for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.jobs.get(slug).cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use edge_sdk::edge_core::RequestId;
    use edge_sdk::edge_data::{FetchError, HttpResponse, TokioTimer};

    use super::*;

    /// Replies with a fixed response and records what was sent.
    struct Scripted {
        response: Result<HttpResponse, FetchError>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::new(status, body.as_bytes().to_vec())),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn failing(err: FetchError) -> Self {
            Self {
                response: Err(err),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for Scripted {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            self.sent.borrow_mut().push(request);
            self.response.clone()
        }
    }

    fn store(transport: &Scripted) -> SupabaseStore<&Scripted, TokioTimer> {
        let credentials = StoreCredentials {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            key: "anon-key".to_string(),
        };
        SupabaseStore::new(
            FetchClient::new(transport, TokioTimer, RequestId::from_string("req-1")),
            credentials,
        )
    }

    fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_lookup_request_shape() {
        let transport = Scripted::replying(200, r#"{"id": 1, "slug": "rust-dev", "title": "Rust Developer"}"#);
        let job = store(&transport).find_by_slug("rust-dev").await.unwrap().unwrap();
        assert_eq!(job.title, "Rust Developer");

        let sent = transport.sent.borrow();
        assert_eq!(
            sent[0].url.as_str(),
            "https://abc.supabase.co/rest/v1/jobs?select=*&slug=eq.rust-dev"
        );
        assert_eq!(header(&sent[0], "apikey"), Some("anon-key"));
        assert_eq!(header(&sent[0], "authorization"), Some("Bearer anon-key"));
        assert_eq!(header(&sent[0], "accept"), Some(SINGLE_OBJECT));
        assert_eq!(header(&sent[0], "x-request-id"), Some("req-1"));
    }

    #[tokio::test]
    async fn test_slug_is_encoded() {
        let transport = Scripted::replying(200, "null");
        let store = store(&transport);
        let url = store.lookup_url("a&b=c").unwrap();
        assert_eq!(url.query(), Some("select=*&slug=eq.a%26b%3Dc"));
        assert_eq!(store.find_by_slug("a&b=c").await, Ok(None));
    }

    #[tokio::test]
    async fn test_store_url_with_path() {
        let transport = Scripted::replying(200, "[]");
        let credentials = StoreCredentials {
            url: Url::parse("https://db.example.com/supabase/").unwrap(),
            key: "k".to_string(),
        };
        let store = SupabaseStore::new(
            FetchClient::new(&transport, TokioTimer, RequestId::from_string("r")),
            credentials,
        );
        assert_eq!(
            store.lookup_url("x").unwrap().as_str(),
            "https://db.example.com/supabase/rest/v1/jobs?select=*&slug=eq.x"
        );
        assert_eq!(store.find_by_slug("x").await, Ok(None));
    }

    #[tokio::test]
    async fn test_no_rows_error_is_parsed() {
        let transport = Scripted::replying(
            406,
            r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        let failure = store(&transport).find_by_slug("gone").await.unwrap_err();
        assert_eq!(failure.code.as_deref(), Some(NO_ROWS_CODE));
        assert!(failure.is_no_rows());
    }

    #[tokio::test]
    async fn test_other_errors_keep_message() {
        let transport = Scripted::replying(
            401,
            r#"{"code":"PGRST301","message":"JWT expired","details":null,"hint":null}"#,
        );
        let failure = store(&transport).find_by_slug("x").await.unwrap_err();
        assert_eq!(failure.message, "JWT expired");
        assert!(!failure.is_no_rows());
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let transport = Scripted::replying(502, "<html>Bad gateway</html>");
        let failure = store(&transport).find_by_slug("x").await.unwrap_err();
        assert_eq!(failure.message, "store responded with HTTP 502");
        assert_eq!(failure.code, None);
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failure() {
        let transport = Scripted::failing(FetchError::Connection("refused".to_string()));
        let failure = store(&transport).find_by_slug("x").await.unwrap_err();
        assert!(failure.message.contains("refused"));
        assert!(!failure.is_no_rows());
    }

    #[tokio::test]
    async fn test_malformed_row() {
        let transport = Scripted::replying(200, r#"{"slug": 5}"#);
        let failure = store(&transport).find_by_slug("x").await.unwrap_err();
        assert!(failure.message.starts_with("malformed job row"));
    }

    #[test]
    fn test_no_rows_detection() {
        assert!(StoreFailure::new("x").with_code(NO_ROWS_CODE).is_no_rows());
        assert!(StoreFailure::new("No rows found").is_no_rows());
        assert!(StoreFailure::new("The result contains 0 rows").is_no_rows());
        assert!(!StoreFailure::new("permission denied").is_no_rows());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryStore::new().with_job(JobRecord::new("a", "A"));
        assert_eq!(store.find_by_slug("a").await.unwrap().map(|j| j.title), Some("A".to_string()));
        assert_eq!(store.find_by_slug("b").await, Ok(None));

        let failing = InMemoryStore::failing(StoreFailure::new("down"));
        assert_eq!(failing.find_by_slug("a").await, Err(StoreFailure::new("down")));
    }
}
