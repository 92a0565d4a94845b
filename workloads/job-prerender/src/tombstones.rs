//! Removed-content registry: paths answered with `410 Gone`.
//!
//! The list is a plain-text file on the site origin, one path per line.
//! Loading fails soft: an unreachable or unreadable list means nothing is
//! tombstoned for this request.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use edge_sdk::edge_data::{DependencyTag, FetchClient, Timer, Transport};
use edge_sdk::edge_observability::StructuredLogger;
use edge_sdk::edge_security::ResourceLimits;

use crate::error::PrerenderError;

/// Location of the list, relative to the site origin.
pub const TOMBSTONE_LIST_PATH: &str = "/410-urls.txt";

/// Immutable set of tombstoned paths. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TombstoneSet {
    paths: Arc<HashSet<String>>,
}

impl TombstoneSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the list format: one path per line, surrounding whitespace
    /// (including CR from CRLF files) trimmed, blank lines skipped. At most
    /// `max_entries` paths are kept.
    pub fn parse(text: &str, max_entries: usize) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(max_entries)
            .collect()
    }

    /// Exact membership test. No case or trailing-slash normalization.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl<S: Into<String>> FromIterator<S> for TombstoneSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: Arc::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

/// Whether `path` is tombstoned.
pub fn is_tombstoned(set: &TombstoneSet, path: &str) -> bool {
    set.contains(path)
}

/// `<base_url>/410-urls.txt`.
pub fn tombstone_list_url(base_url: &str) -> Result<Url, PrerenderError> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), TOMBSTONE_LIST_PATH);
    Url::parse(&raw).map_err(|e| PrerenderError::TombstoneListUnavailable(format!("{}: {}", raw, e)))
}

/// Fetch and parse the list. Any failure is `TombstoneListUnavailable`.
pub async fn fetch_tombstones<T: Transport, M: Timer>(
    client: &FetchClient<T, M>,
    base_url: &str,
    max_entries: usize,
) -> Result<TombstoneSet, PrerenderError> {
    let url = tombstone_list_url(base_url)?;
    let text = client
        .get_text(&url, DependencyTag::Tombstones)
        .await
        .map_err(|e| PrerenderError::TombstoneListUnavailable(e.to_string()))?;
    Ok(TombstoneSet::parse(&text, max_entries))
}

/// Fetch the list, degrading to an empty set (with a warning) on failure.
pub async fn load_tombstones<T: Transport, M: Timer>(
    client: &FetchClient<T, M>,
    base_url: &str,
    logger: &StructuredLogger,
) -> TombstoneSet {
    let max_entries = ResourceLimits::default().max_tombstone_entries;
    or_empty(fetch_tombstones(client, base_url, max_entries).await, logger)
}

/// Unwrap a load result, logging and swallowing the failure.
pub(crate) fn or_empty(
    result: Result<TombstoneSet, PrerenderError>,
    logger: &StructuredLogger,
) -> TombstoneSet {
    match result {
        Ok(set) => {
            logger
                .info_builder("tombstones loaded")
                .field_u64("count", set.len() as u64)
                .emit();
            set
        }
        Err(err) => {
            logger
                .warn_builder("tombstones unavailable")
                .field("error", err.to_string())
                .emit();
            TombstoneSet::empty()
        }
    }
}

/// Where the dispatcher gets the tombstone list from.
#[async_trait(?Send)]
pub trait TombstoneSource {
    async fn load(&self) -> Result<TombstoneSet, PrerenderError>;
}

#[async_trait(?Send)]
impl<S: TombstoneSource + ?Sized> TombstoneSource for &S {
    async fn load(&self) -> Result<TombstoneSet, PrerenderError> {
        (**self).load().await
    }
}

/// The list served by the site origin.
pub struct RemoteTombstones<T, M> {
    client: FetchClient<T, M>,
    base_url: String,
    max_entries: usize,
}

impl<T: Transport, M: Timer> RemoteTombstones<T, M> {
    pub fn new(client: FetchClient<T, M>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_entries: ResourceLimits::default().max_tombstone_entries,
        }
    }

    pub fn with_limits(mut self, limits: &ResourceLimits) -> Self {
        self.max_entries = limits.max_tombstone_entries;
        self
    }
}

#[async_trait(?Send)]
impl<T: Transport, M: Timer> TombstoneSource for RemoteTombstones<T, M> {
    async fn load(&self) -> Result<TombstoneSet, PrerenderError> {
        fetch_tombstones(&self.client, &self.base_url, self.max_entries).await
    }
}

/// A fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticTombstones(pub TombstoneSet);

#[async_trait(?Send)]
impl TombstoneSource for StaticTombstones {
    async fn load(&self) -> Result<TombstoneSet, PrerenderError> {
        Ok(self.0.clone())
    }
}

/// Keeps the first successfully loaded list for the life of `cache`.
/// Failures are not cached, so the next request tries again.
pub struct CachedTombstones<'c, S> {
    inner: S,
    cache: &'c OnceCell<TombstoneSet>,
}

impl<'c, S: TombstoneSource> CachedTombstones<'c, S> {
    pub fn new(inner: S, cache: &'c OnceCell<TombstoneSet>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait(?Send)]
impl<'c, S: TombstoneSource> TombstoneSource for CachedTombstones<'c, S> {
    async fn load(&self) -> Result<TombstoneSet, PrerenderError> {
        if let Some(set) = self.cache.get() {
            return Ok(set.clone());
        }
        let set = self.inner.load().await?;
        Ok(self.cache.get_or_init(|| set).clone())
    }
}
