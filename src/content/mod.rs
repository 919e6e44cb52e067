//! Filtered, paginated, sortable admin content listing. The controller owns
//! the query state, derives the canonical server query from it, and
//! reconciles local mutations. Filtering happens server-side only; items are
//! never re-filtered in memory.

use crate::{
    api::Api,
    errors::AppError,
    session::{Realm, SessionGuard},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tracing::{debug, warn};

/// Page size the admin screen requests by default.
pub const DEFAULT_PAGE_SIZE: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Opaque content record keyed by a stable identifier. Only `id` is ever
/// inspected; the remaining fields are carried verbatim for display.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One server page: items plus the authoritative totals. `total` and
/// `pages` are never computed locally.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPage {
    pub data: Vec<ContentItem>,
    pub total: u64,
    pub pages: u64,
}

/// Filter, sort, and pagination state for the content list.
///
/// Invariant: `page <= max(page_count, 1)`. Changing any filter or the sort
/// resets the page to 1; changing the page alone leaves filters untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQueryState {
    filters: BTreeMap<String, String>,
    sort_key: String,
    sort_order: SortOrder,
    page: u64,
    page_size: u64,
    total: u64,
    page_count: u64,
}

impl Default for ListQueryState {
    /// The admin screen's initial state: everything, newest first.
    fn default() -> Self {
        let mut filters = BTreeMap::new();
        filters.insert("type_filter".to_string(), "all".to_string());
        filters.insert("platform_filter".to_string(), "all".to_string());

        Self {
            filters,
            sort_key: "year".to_string(),
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
            page_count: 1,
        }
    }
}

impl ListQueryState {
    /// Set one filter; any filter change resets the page to 1.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(key.into(), value.into());
        self.page = 1;
    }

    /// Set the sort key and order; any sort change resets the page to 1.
    pub fn set_sort(&mut self, key: impl Into<String>, order: SortOrder) {
        self.sort_key = key.into();
        self.sort_order = order;
        self.page = 1;
    }

    /// Move to `page` if it is within `[1, max(page_count, 1)]`.
    /// Out-of-range requests are no-ops, not errors.
    pub fn set_page(&mut self, page: u64) {
        if page >= 1 && page <= self.page_count.max(1) {
            self.page = page;
        }
    }

    /// Change the page size; treated like a filter change, so the page
    /// resets to 1.
    pub fn set_page_size(&mut self, page_size: u64) {
        if page_size >= 1 {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub const fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Canonical query for the current state: identical logical state always
    /// serializes to the same pair list. Filters come first in key order,
    /// then sort and pagination.
    #[must_use]
    pub fn canonical_query(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        pairs.push(("sort_by".to_string(), self.sort_key.clone()));
        pairs.push(("order".to_string(), self.sort_order.as_str().to_string()));
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.page_size.to_string()));

        pairs
    }

    // Server-reported totals overwrite local ones wholesale; the page is
    // clamped back into range when the collection shrank underneath us.
    fn apply_totals(&mut self, total: u64, pages: u64) {
        self.total = total;
        self.page_count = pages;
        self.page = self.page.min(self.page_count.max(1));
    }
}

#[derive(Debug)]
struct ListInner {
    query: ListQueryState,
    items: Vec<ContentItem>,
    applied_seq: u64,
}

/// Controller for the admin content list. State transitions are synchronous;
/// `refresh` and `remove_item` talk to the server, authorized through the
/// shared [`SessionGuard`]. Overlapping refreshes are resolved by issuance
/// order: each request carries a monotonically increasing sequence number and
/// a response is discarded when a later-issued one has already been applied.
#[derive(Debug)]
pub struct ContentList {
    api: Api,
    guard: Arc<SessionGuard>,
    inner: RwLock<ListInner>,
    issued_seq: AtomicU64,
}

impl ContentList {
    #[must_use]
    pub fn new(api: Api, guard: Arc<SessionGuard>) -> Self {
        Self {
            api,
            guard,
            inner: RwLock::new(ListInner {
                query: ListQueryState::default(),
                items: Vec::new(),
                applied_seq: 0,
            }),
            issued_seq: AtomicU64::new(0),
        }
    }

    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().query.set_filter(key, value);
    }

    pub fn set_sort(&self, key: impl Into<String>, order: SortOrder) {
        self.write().query.set_sort(key, order);
    }

    pub fn set_page(&self, page: u64) {
        self.write().query.set_page(page);
    }

    pub fn set_page_size(&self, page_size: u64) {
        self.write().query.set_page_size(page_size);
    }

    /// Snapshot of the current query state.
    #[must_use]
    pub fn state(&self) -> ListQueryState {
        self.read().query.clone()
    }

    /// Snapshot of the currently held items.
    #[must_use]
    pub fn items(&self) -> Vec<ContentItem> {
        self.read().items.clone()
    }

    /// Issue one authorized fetch for the current state. On success the
    /// items and the server totals are overwritten; on an authorization
    /// rejection the admin session is invalidated; on any other failure the
    /// held state is left untouched so stale data remains visible.
    ///
    /// # Errors
    /// `Unauthorized` when no admin session exists or the server rejected
    /// the token, `Transport` on any other failure.
    pub async fn refresh(&self) -> Result<Vec<ContentItem>, AppError> {
        let bearer = self
            .guard
            .authorize(Realm::Admin)
            .ok_or(AppError::Unauthorized)?;

        let (seq, query) = self.begin_refresh();

        match self.api.content_list(&bearer, &query).await {
            Ok(page) => {
                self.apply_refresh(seq, page);
                Ok(self.items())
            }
            Err(AppError::Unauthorized) => {
                self.expire();
                Err(AppError::Unauthorized)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete `id` on the server, then drop it from the local collection
    /// without forcing a refresh. The totals deliberately stay as last
    /// reported until the next successful `refresh`.
    ///
    /// # Errors
    /// `Unauthorized` when no admin session exists or the server rejected
    /// the token, `Transport` on any other failure. The local collection is
    /// only touched on success.
    pub async fn remove_item(&self, id: &str) -> Result<(), AppError> {
        let bearer = self
            .guard
            .authorize(Realm::Admin)
            .ok_or(AppError::Unauthorized)?;

        match self.api.delete_content(&bearer, id).await {
            Ok(()) => {
                self.write().items.retain(|item| item.id != id);
                Ok(())
            }
            Err(AppError::Unauthorized) => {
                self.expire();
                Err(AppError::Unauthorized)
            }
            Err(err) => Err(err),
        }
    }

    // Hand out the next sequence number together with the canonical query it
    // was issued for.
    fn begin_refresh(&self) -> (u64, Vec<(String, String)>) {
        let seq = self.issued_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.read().query.canonical_query();

        (seq, query)
    }

    // Apply a fetched page unless a later-issued response already won.
    fn apply_refresh(&self, seq: u64, page: ContentPage) -> bool {
        let mut inner = self.write();

        if seq <= inner.applied_seq {
            debug!(seq, applied = inner.applied_seq, "discarding stale refresh response");
            return false;
        }

        inner.applied_seq = seq;
        inner.query.apply_totals(page.total, page.pages);
        inner.items = page.data;

        true
    }

    // An expired token mid-use is treated exactly like never having signed
    // in: invalidate and let the caller redirect.
    fn expire(&self) {
        if let Err(err) = self.guard.invalidate(Realm::Admin) {
            warn!("failed to invalidate admin session: {err}");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ListInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ListInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use anyhow::{anyhow, Result};
    use secrecy::SecretString;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn admin_guard() -> Arc<SessionGuard> {
        let guard = SessionGuard::in_memory();
        guard
            .persist(Session::new(
                Realm::Admin,
                SecretString::from("admin-token".to_string()),
                "root",
            ))
            .expect("in-memory persist cannot fail");
        Arc::new(guard)
    }

    fn list_for(server: &MockServer) -> Result<ContentList> {
        Ok(ContentList::new(Api::new(&server.uri())?, admin_guard()))
    }

    fn page(ids: &[&str], total: u64, pages: u64) -> ContentPage {
        let data = ids
            .iter()
            .map(|id| ContentItem {
                id: (*id).to_string(),
                fields: serde_json::Map::new(),
            })
            .collect();
        ContentPage { data, total, pages }
    }

    #[test]
    fn filter_and_sort_changes_reset_page() {
        let mut state = ListQueryState::default();
        state.apply_totals(45, 3);
        state.set_page(2);
        assert_eq!(state.page(), 2);

        state.set_filter("type_filter", "movie");
        assert_eq!(state.page(), 1);
        assert_eq!(state.filter("type_filter"), Some("movie"));

        state.set_page(2);
        state.set_sort("title", SortOrder::Asc);
        assert_eq!(state.page(), 1);
        assert_eq!(state.sort_key(), "title");
        assert_eq!(state.sort_order(), SortOrder::Asc);
        // Changing sort does not touch filters.
        assert_eq!(state.filter("type_filter"), Some("movie"));
    }

    #[test]
    fn set_page_is_a_no_op_out_of_range() {
        let mut state = ListQueryState::default();
        state.apply_totals(30, 2);

        state.set_page(0);
        assert_eq!(state.page(), 1);

        state.set_page(3);
        assert_eq!(state.page(), 1);

        state.set_page(2);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn canonical_query_is_deterministic_and_ordered() {
        let mut a = ListQueryState::default();
        a.set_sort("imdb", SortOrder::Desc);
        a.set_filter("type_filter", "movie");

        let mut b = ListQueryState::default();
        b.set_filter("type_filter", "movie");
        b.set_sort("imdb", SortOrder::Desc);

        // Identical logical state serializes identically, regardless of the
        // order the transitions happened in.
        assert_eq!(a.canonical_query(), b.canonical_query());

        let pairs = a.canonical_query();
        let keys: Vec<&str> = pairs.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["platform_filter", "type_filter", "sort_by", "order", "page", "limit"]
        );
    }

    #[test]
    fn totals_are_overwritten_wholesale_and_page_clamped() {
        let mut state = ListQueryState::default();
        state.apply_totals(45, 3);
        state.set_page(3);

        // The collection shrank server-side; the page falls back into range.
        state.apply_totals(5, 1);
        assert_eq!(state.total(), 5);
        assert_eq!(state.page_count(), 1);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn later_issued_response_wins_regardless_of_arrival_order() -> Result<()> {
        let server_stub = "http://localhost:1";
        let list = ContentList::new(Api::new(server_stub)?, admin_guard());

        let (seq_a, _) = list.begin_refresh();
        let (seq_b, _) = list.begin_refresh();

        // B's response arrives first and is applied.
        assert!(list.apply_refresh(seq_b, page(&["b1", "b2"], 2, 1)));
        // A's late response must be discarded without touching state.
        assert!(!list.apply_refresh(seq_a, page(&["a1"], 1, 1)));

        let ids: Vec<String> = list.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(list.state().total(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_sends_canonical_query_and_applies_page() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .and(header("authorization", "Bearer admin-token"))
            .and(query_param("type_filter", "movie"))
            .and(query_param("platform_filter", "all"))
            .and(query_param("sort_by", "imdb"))
            .and(query_param("order", "desc"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"_id": "m1", "title": "Movie One", "imdb": 8.4},
                    {"_id": "m2", "title": "Movie Two", "imdb": 7.9}
                ],
                "total": 2,
                "pages": 1
            })))
            .mount(&server)
            .await;

        let list = list_for(&server)?;
        list.set_filter("type_filter", "movie");
        list.set_sort("imdb", SortOrder::Desc);

        let items = list.refresh().await?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "m1");
        assert_eq!(
            items[0].fields.get("title"),
            Some(&json!("Movie One"))
        );
        assert_eq!(list.state().total(), 2);
        assert_eq!(list.state().page_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_401_invalidates_the_admin_session() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let guard = admin_guard();
        let list = ContentList::new(Api::new(&server.uri())?, Arc::clone(&guard));

        let result = list.refresh().await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
        // Expired mid-use now looks identical to never having signed in.
        assert!(guard.current(Realm::Admin).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_failure_leaves_stale_state_visible() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"_id": "m1", "title": "Kept"}],
                "total": 1,
                "pages": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = list_for(&server)?;
        list.refresh().await?;

        // The next fetch blows up server-side; the held page must survive.
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = list.refresh().await;
        assert!(matches!(result, Err(AppError::Transport(_))));

        let ids: Vec<String> = list.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["m1"]);
        assert_eq!(list.state().total(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn remove_item_is_optimistic_and_leaves_totals_alone() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"_id": "m1", "title": "One"},
                    {"_id": "m2", "title": "Two"}
                ],
                "total": 2,
                "pages": 1
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/admin/content/m1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let list = list_for(&server)?;
        list.refresh().await?;

        list.remove_item("m1").await?;

        let ids: Vec<String> = list.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["m2"]);
        // The count stays authoritative-from-the-server until the next
        // refresh; this window is intentional.
        assert_eq!(list.state().total(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn remove_item_failure_keeps_the_item() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/content-list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"_id": "m1", "title": "One"}],
                "total": 1,
                "pages": 1
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/admin/content/m1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let list = list_for(&server)?;
        list.refresh().await?;

        let result = list.remove_item("m1").await;
        assert!(matches!(result, Err(AppError::Transport(_))));

        let ids: Vec<String> = list.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["m1"]);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_a_session_is_unauthorized() -> Result<()> {
        let list = ContentList::new(
            Api::new("http://localhost:1")?,
            Arc::new(SessionGuard::in_memory()),
        );

        let result = list.refresh().await;
        match result {
            Err(AppError::Unauthorized) => Ok(()),
            other => Err(anyhow!("expected Unauthorized, got {other:?}")),
        }
    }
}
