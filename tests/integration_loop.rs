//! Loop traversal integration tests
//!
//! Runs queries against an in-memory fixture and walks them the way a
//! template does, including a nested loop inside an outer one.

use postloop::domain::{PageSize, QueryCriteria, StatusFilter};
use postloop::hooks::{Callable, HookValue, LOOP_END, LOOP_START, THE_POST};
use postloop::loops::LoopPhase;
use postloop::repository::InMemoryRepository;
use postloop::{Query, Request, Result};
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

const FIXTURE: &str = r#"
authors:
  - id: 1
    name: alice
items:
  - id: 1
    type: article
    title: First article
    created_at: "2024-01-01T00:00:00Z"
  - id: 2
    type: article
    title: Second article
    created_at: "2024-01-02T00:00:00Z"
  - id: 3
    type: article
    title: Third article
    body: "intro\n<!--nextpage-->\nmiddle\n<!--nextpage-->\nend"
    created_at: "2024-01-03T00:00:00Z"
  - id: 4
    type: article
    title: Fourth article
    created_at: "2024-01-04T00:00:00Z"
  - id: 5
    type: article
    title: Fifth article
    created_at: "2024-01-05T00:00:00Z"
  - ID: 10
    post_type: page
    post_title: Related one
    post_author: 1
    post_date: "2023-06-01 00:00:00"
  - ID: 11
    post_type: page
    post_title: Related two
    post_author: 1
    post_date: "2023-06-02 00:00:00"
  - ID: 12
    post_type: page
    post_title: Unpublished
    post_status: draft
"#;

fn repository() -> InMemoryRepository {
    InMemoryRepository::from_yaml_str(FIXTURE).unwrap()
}

fn oldest_first(item_type: &str) -> QueryCriteria {
    QueryCriteria::new()
        .with_type(item_type)
        .with_ordering(
            postloop::domain::OrderField::Created,
            postloop::domain::OrderDirection::Asc,
        )
        .with_page_size(PageSize::Unbounded)
}

fn record(request: &Request) -> Rc<RefCell<Vec<String>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    for hook in [LOOP_START, THE_POST, LOOP_END] {
        let events = events.clone();
        request.hooks().on_with(
            hook,
            &Callable::action(move |_, args| {
                let snapshot = args.iter().find_map(HookValue::as_loop);
                let label = match (args.first().and_then(HookValue::as_item), snapshot) {
                    (Some(item), Some(s)) => format!("{}:{}@{}", hook, item.id, s.loop_id),
                    (_, Some(s)) => format!("{}@{}", hook, s.loop_id),
                    _ => hook.to_string(),
                };
                events.borrow_mut().push(label);
                Ok(())
            }),
            10,
            2,
        );
    }
    events
}

#[test]
fn test_full_traversal_fires_each_hook_as_expected() -> Result<()> {
    let request = Request::new();
    let events = record(&request);
    let repo = repository();
    let mut query = Query::new(&request, &repo, oldest_first("article"));
    let id = query.cursor().id();

    let mut seen = Vec::new();
    while query.has_next(&request)? {
        let item = query.advance(&request)?.unwrap();
        assert_eq!(request.context().current().map(|c| c.id), Some(item.id));
        seen.push(item.id);
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(request.hooks().did_action(LOOP_START), 1);
    assert_eq!(request.hooks().did_action(THE_POST), 5);
    assert_eq!(request.hooks().did_action(LOOP_END), 1);

    let events = events.borrow();
    assert_eq!(events.first(), Some(&format!("loop_start@{}", id)));
    assert_eq!(events.last(), Some(&format!("loop_end@{}", id)));
    assert_eq!(events.len(), 7);

    // Further polling neither advances nor ends again
    assert!(!query.has_next(&request)?);
    assert!(query.advance(&request)?.is_none());
    assert_eq!(request.hooks().did_action(LOOP_END), 1);
    assert_eq!(query.cursor().phase(), LoopPhase::Exhausted);
    Ok(())
}

#[test]
fn test_nested_loop_restores_outer_item() -> Result<()> {
    let request = Request::new();
    let events = record(&request);
    let repo = repository();

    let mut outer = Query::new(&request, &repo, oldest_first("article"));
    for _ in 0..3 {
        outer.advance(&request)?;
    }
    assert_eq!(outer.cursor().cursor_index(), 2);
    let outer_item = outer.current().cloned().unwrap();
    assert_eq!(outer_item.id, 3);

    let mut inner = Query::new(&request, &repo, oldest_first("page"));
    let mut related = Vec::new();
    while inner.has_next(&request)? {
        related.push(inner.advance(&request)?.unwrap().id);
    }
    assert_eq!(related, vec![10, 11]);
    assert_eq!(request.context().current().map(|c| c.id), Some(11));

    events.borrow_mut().clear();
    assert!(inner.restore_outer(&outer, &request)?);

    // Context is back on the outer item, the outer cursor did not move
    assert_eq!(request.context().current(), Some(&outer_item));
    assert_eq!(request.context().owner(), Some(outer.cursor().id()));
    assert_eq!(request.context().total_pages(), 3);
    assert_eq!(outer.cursor().cursor_index(), 2);
    assert_eq!(inner.cursor().cursor_index(), -1);
    assert_eq!(*events.borrow(), vec![format!("the_post:3@{}", outer.cursor().id())]);

    // The outer loop carries on from where it was
    assert_eq!(outer.advance(&request)?.map(|i| i.id), Some(4));
    Ok(())
}

#[test]
fn test_restore_without_outer_position_is_noop() -> Result<()> {
    let request = Request::new();
    let repo = repository();
    let outer = Query::new(&request, &repo, oldest_first("article"));
    let mut inner = Query::new(&request, &repo, oldest_first("page"));
    inner.advance(&request)?;

    assert!(!inner.restore_outer(&outer, &request)?);
    assert_eq!(request.context().current().map(|c| c.id), Some(10));
    assert_eq!(inner.cursor().cursor_index(), 0);
    Ok(())
}

#[test]
fn test_empty_loop_fires_nothing() -> Result<()> {
    let request = Request::new();
    let events = record(&request);
    let repo = repository();
    let mut query = Query::new(&request, &repo, QueryCriteria::new().with_type("recipe"));

    assert!(query.result().is_not_found());
    assert!(!query.has_next(&request)?);
    assert!(query.advance(&request)?.is_none());
    assert!(events.borrow().is_empty());
    assert!(request.context().current().is_none());
    Ok(())
}

#[test]
fn test_rewind_allows_second_pass() -> Result<()> {
    let request = Request::new();
    let repo = repository();
    let mut query = Query::new(&request, &repo, oldest_first("page"));

    while query.has_next(&request)? {
        query.advance(&request)?;
    }
    query.rewind();
    while query.has_next(&request)? {
        query.advance(&request)?;
    }

    assert_eq!(request.hooks().did_action(LOOP_START), 2);
    assert_eq!(request.hooks().did_action(THE_POST), 4);
    assert_eq!(request.hooks().did_action(LOOP_END), 2);
    Ok(())
}

#[test]
fn test_requested_page_is_clamped() -> Result<()> {
    let request = Request::new();
    let repo = repository();
    request.context_mut().set_page(9);

    let mut query = Query::new(&request, &repo, QueryCriteria::new().with_id(3));
    assert!(query.result().is_single());
    query.advance(&request)?;

    let context = request.context();
    assert!(context.is_multi_page());
    assert_eq!(context.page(), 3);
    assert_eq!(context.page_content(), Some("end"));
    assert!(context.show_full());
    Ok(())
}

#[test]
fn test_status_and_author_filters_from_fixture() -> Result<()> {
    let request = Request::new();
    let repo = repository();

    let by_author = Query::new(
        &request,
        &repo,
        QueryCriteria::new().with_author(postloop::domain::AuthorFilter::Name("alice".to_string())),
    );
    assert_eq!(by_author.found_count(), 2);

    let everything = Query::new(
        &request,
        &repo,
        QueryCriteria::new().with_status(StatusFilter::Any).with_page_size(PageSize::Unbounded),
    );
    assert_eq!(everything.found_count(), 8);
    Ok(())
}

#[test]
fn test_fixture_file_with_query_string() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("content.yml");
    std::fs::write(&path, FIXTURE)?;

    let request = Request::new();
    let repo = InMemoryRepository::load(&path)?;
    let criteria = QueryCriteria::from_query_string("post_type=article&posts_per_page=2&paged=2&order=asc")?;
    let query = Query::new(&request, &repo, criteria);

    let ids: Vec<u64> = query.items().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(query.found_count(), 5);
    assert_eq!(query.page_count(), 3);
    Ok(())
}
