//! Query execution.
//!
//! `Query::new` resolves criteria against a repository immediately and
//! owns the cursor that walks the result. Resolution is tried in order:
//! a single id, then a slug (falling back to an exact title), then a
//! listing search. A repository failure never escapes: it is logged and
//! recorded on the result, which is then empty.

use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::rc::Rc;

use super::plan::QueryPlan;
use crate::domain::{ContentItem, ItemId, QueryCriteria, QueryResult};
use crate::error::Result;
use crate::loops::{LoopCursor, LoopSnapshot};
use crate::repository::{ContentRepository, RepositoryError};
use crate::request::Request;

/// One executed query and its loop
#[derive(Debug, Clone)]
pub struct Query {
    criteria: QueryCriteria,
    plan: QueryPlan,
    result: QueryResult,
    cursor: LoopCursor,
}

impl Query {
    pub fn new(request: &Request, repository: &dyn ContentRepository, criteria: QueryCriteria) -> Self {
        let plan = QueryPlan::build(&criteria, request.query_defaults());
        let result = match resolve(repository, &criteria, &plan) {
            Ok(result) => result,
            Err(e) => {
                warn!("Query degraded to an empty result: {}", e);
                QueryResult::failed(e.to_string())
            }
        };

        let cursor = LoopCursor::new(request.next_loop_id(), result.items().to_vec());
        info!(
            "Loop {} resolved {:?}: {} items, {} found, {} pages",
            cursor.id(),
            result.kind(),
            result.len(),
            result.found_count(),
            result.page_count()
        );

        Self {
            criteria,
            plan,
            result,
            cursor,
        }
    }

    /// Coerce a raw argument bag and run it.
    pub fn from_args(
        request: &Request,
        repository: &dyn ContentRepository,
        args: &Map<String, Value>,
    ) -> Result<Self> {
        let criteria = QueryCriteria::from_args(args)?;
        Ok(Self::new(request, repository, criteria))
    }

    pub fn criteria(&self) -> &QueryCriteria {
        &self.criteria
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn result(&self) -> &QueryResult {
        &self.result
    }

    pub fn items(&self) -> &[Rc<ContentItem>] {
        self.result.items()
    }

    pub fn found_count(&self) -> u64 {
        self.result.found_count()
    }

    pub fn page_count(&self) -> u64 {
        self.result.page_count()
    }

    pub fn error(&self) -> Option<&str> {
        self.result.error()
    }

    //=== Loop ===

    pub fn cursor(&self) -> &LoopCursor {
        &self.cursor
    }

    pub fn current(&self) -> Option<&Rc<ContentItem>> {
        self.cursor.current()
    }

    pub fn has_next(&mut self, request: &Request) -> Result<bool> {
        self.cursor.has_next(request)
    }

    pub fn advance(&mut self, request: &Request) -> Result<Option<Rc<ContentItem>>> {
        self.cursor.advance(request)
    }

    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    /// Hand the request context back to `outer` after this (nested) loop.
    pub fn restore_outer(&mut self, outer: &Query, request: &Request) -> Result<bool> {
        self.cursor.restore_outer(&outer.cursor, request)
    }

    /// Restore from a snapshot, as handed to `the_post` listeners.
    pub fn restore_from(&mut self, outer: &LoopSnapshot, request: &Request) -> Result<bool> {
        self.cursor.restore_from(outer, request)
    }
}

fn resolve(
    repository: &dyn ContentRepository,
    criteria: &QueryCriteria,
    plan: &QueryPlan,
) -> std::result::Result<QueryResult, RepositoryError> {
    if let Some(id) = criteria.id() {
        return resolve_single(repository, plan, Some(id));
    }

    if let Some(slug) = criteria.slug() {
        let id = match repository.find_by_slug(slug)? {
            Some(id) => Some(id),
            None => {
                debug!("No item with slug '{}', trying title", slug);
                repository.find_by_title(slug)?
            }
        };
        return resolve_single(repository, plan, id);
    }

    let found = repository.search(plan)?;
    let items = repository.load_many(&found.ids)?;
    Ok(QueryResult::listing(items, found.total, plan.page_count(found.total)))
}

fn resolve_single(
    repository: &dyn ContentRepository,
    plan: &QueryPlan,
    id: Option<ItemId>,
) -> std::result::Result<QueryResult, RepositoryError> {
    let Some(id) = id else {
        return Ok(QueryResult::not_found());
    };

    match repository.find_by_id(id)? {
        Some(item) if plan.status.accepts(item.status) && plan.types.accepts(&item.item_type) => {
            Ok(QueryResult::single(item))
        }
        Some(item) => {
            debug!("Item {} rejected: {} {}", id, item.item_type, item.status);
            Ok(QueryResult::not_found())
        }
        None => Ok(QueryResult::not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentStatus, PageSize, ResultKind, StatusFilter};
    use crate::repository::{InMemoryRepository, SearchResult};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn articles(n: u64) -> InMemoryRepository {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InMemoryRepository::with_items(
            (1..=n).map(|i| ContentItem::new(i, "article", format!("Article {}", i)).with_created(base + Duration::hours(i as i64))),
        )
    }

    struct Offline;

    impl ContentRepository for Offline {
        fn find_by_id(&self, _id: ItemId) -> std::result::Result<Option<ContentItem>, RepositoryError> {
            Err(RepositoryError::Unavailable("offline".to_string()))
        }

        fn find_by_slug(&self, _slug: &str) -> std::result::Result<Option<ItemId>, RepositoryError> {
            Err(RepositoryError::Unavailable("offline".to_string()))
        }

        fn search(&self, _plan: &QueryPlan) -> std::result::Result<SearchResult, RepositoryError> {
            Err(RepositoryError::Backend("connection reset".to_string()))
        }

        fn load_many(&self, _ids: &[ItemId]) -> std::result::Result<Vec<ContentItem>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_listing_pagination() {
        let request = Request::new();
        let criteria = QueryCriteria::new()
            .with_type("article")
            .with_status(StatusFilter::Published)
            .with_page_size(PageSize::Limit(2))
            .with_page(1);
        let query = Query::new(&request, &articles(5), criteria);

        assert_eq!(query.found_count(), 5);
        assert_eq!(query.items().len(), 2);
        assert_eq!(query.page_count(), 3);
        assert!(query.result().is_archive());
        assert!(!query.result().is_single());
        // Newest first
        assert_eq!(query.items()[0].id, 5);
    }

    #[test]
    fn test_last_partial_page() {
        let request = Request::new();
        let criteria = QueryCriteria::new().with_page_size(PageSize::Limit(2)).with_page(3);
        let query = Query::new(&request, &articles(5), criteria);
        assert_eq!(query.items().len(), 1);
        assert_eq!(query.items()[0].id, 1);
        assert!(!query.result().is_archive());
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let request = Request::new();
        let criteria = QueryCriteria::new().with_page_size(PageSize::Limit(2)).with_page(9);
        let query = Query::new(&request, &articles(5), criteria);
        assert!(query.result().is_not_found());
        assert_eq!(query.found_count(), 5);
        assert!(query.error().is_none());
    }

    #[test]
    fn test_unbounded_has_one_page() {
        let request = Request::new();
        let query = Query::new(
            &request,
            &articles(25),
            QueryCriteria::new().with_page_size(PageSize::Unbounded),
        );
        assert_eq!(query.items().len(), 25);
        assert_eq!(query.page_count(), 1);
    }

    #[test]
    fn test_single_by_id() {
        let request = Request::new();
        let query = Query::new(&request, &articles(3), QueryCriteria::new().with_id(2));
        assert_eq!(query.result().kind(), ResultKind::Single);
        assert!(query.result().is_single());
        assert_eq!(query.items()[0].title, "Article 2");
        assert_eq!(query.found_count(), 1);
    }

    #[test]
    fn test_single_draft_under_published_is_not_found() {
        let request = Request::new();
        let repo = InMemoryRepository::with_items([
            ContentItem::new(7, "article", "Hidden").with_status(ContentStatus::Draft)
        ]);
        let query = Query::new(
            &request,
            &repo,
            QueryCriteria::new().with_id(7).with_status(StatusFilter::Published),
        );
        assert!(query.result().is_not_found());
        assert!(!query.result().is_single());
        assert!(query.items().is_empty());

        let drafts = Query::new(&request, &repo, QueryCriteria::new().with_id(7).with_status(StatusFilter::Draft));
        assert!(drafts.result().is_single());
    }

    #[test]
    fn test_single_wrong_type_is_not_found() {
        let request = Request::new();
        let query = Query::new(&request, &articles(3), QueryCriteria::new().with_id(1).with_type("page"));
        assert!(query.result().is_not_found());
    }

    #[test]
    fn test_slug_then_title_fallback() {
        let request = Request::new();
        let repo = InMemoryRepository::with_items([
            ContentItem::new(1, "page", "About Us").with_slug("about"),
        ]);

        let by_slug = Query::new(&request, &repo, QueryCriteria::new().with_slug("about"));
        assert!(by_slug.result().is_single());

        let by_title = Query::new(&request, &repo, QueryCriteria::new().with_slug("About Us"));
        assert!(by_title.result().is_single());
        assert_eq!(by_title.items()[0].id, 1);

        let miss = Query::new(&request, &repo, QueryCriteria::new().with_slug("contact"));
        assert!(miss.result().is_not_found());
    }

    #[test]
    fn test_repository_failure_degrades() {
        let request = Request::new();
        let mut query = Query::new(&request, &Offline, QueryCriteria::new().with_type("article"));

        assert!(query.result().is_not_found());
        assert!(query.items().is_empty());
        assert!(query.error().unwrap_or_default().contains("connection reset"));

        // Looping over the failed result is safe
        assert!(!query.has_next(&request).unwrap());
        assert!(query.advance(&request).unwrap().is_none());
        assert_eq!(request.hooks().did_action("loop_end"), 0);

        let single = Query::new(&request, &Offline, QueryCriteria::new().with_id(1));
        assert!(single.error().is_some());
    }

    #[test]
    fn test_from_args() {
        let request = Request::new();
        let args = match json!({"post_type": "article", "posts_per_page": "2", "paged": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let query = Query::from_args(&request, &articles(5), &args).unwrap();
        assert_eq!(query.plan().offset, 2);
        let ids: Vec<ItemId> = query.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_loops_get_distinct_ids() {
        let request = Request::new();
        let repo = articles(1);
        let first = Query::new(&request, &repo, QueryCriteria::new());
        let second = Query::new(&request, &repo, QueryCriteria::new());
        assert_ne!(first.cursor().id(), second.cursor().id());
    }

    #[test]
    fn test_zero_page_size_has_one_page() {
        let request = Request::with_config(crate::config::QueryConfig {
            default_page_size: 3,
            ..Default::default()
        });
        let query = Query::new(
            &request,
            &articles(25),
            QueryCriteria::new().with_page_size(PageSize::Limit(0)),
        );
        assert_eq!(query.found_count(), 25);
        assert_eq!(query.page_count(), 1);
        assert_eq!(query.items().len(), 25);
    }

    #[test]
    fn test_missing_page_size_uses_request_default() {
        let request = Request::with_config(crate::config::QueryConfig {
            default_page_size: 3,
            ..Default::default()
        });
        let query = Query::new(&request, &articles(5), QueryCriteria::new());
        assert_eq!(query.items().len(), 3);
        assert_eq!(query.page_count(), 2);
    }
}
