//! In-memory repository.
//!
//! Holds items in insertion order and evaluates plans by scanning them.
//! Loaded from a `ContentFixture` (YAML or JSON) for the CLI; built directly
//! in tests.

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::record::ContentFixture;
use super::{ContentRepository, RepositoryError, SearchResult};
use crate::domain::{AuthorFilter, ContentItem, ItemId};
use crate::error::Result;
use crate::query::QueryPlan;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Vec<ContentItem>,
    authors: HashMap<u64, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
            authors: HashMap::new(),
        }
    }

    pub fn insert(&mut self, item: ContentItem) {
        self.items.push(item);
    }

    pub fn add_author(&mut self, id: u64, name: impl Into<String>) {
        self.authors.insert(id, name.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Normalize every record of a fixture; the first malformed one fails.
    pub fn from_fixture(fixture: ContentFixture) -> std::result::Result<Self, RepositoryError> {
        let mut repo = Self::new();
        for author in fixture.authors {
            repo.add_author(author.id, author.name);
        }
        for raw in fixture.items {
            repo.insert(ContentItem::try_from(raw)?);
        }
        debug!("Loaded {} items and {} authors", repo.items.len(), repo.authors.len());
        Ok(repo)
    }

    /// Parse a YAML fixture.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let fixture: ContentFixture = serde_yaml::from_str(content)?;
        Ok(Self::from_fixture(fixture)?)
    }

    /// Parse a JSON fixture, e.g. an export of the legacy store.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let fixture: ContentFixture = serde_json::from_str(content)?;
        Ok(Self::from_fixture(fixture)?)
    }

    /// Load a fixture file; `.json` files are read as JSON, anything else
    /// as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    fn author_matches(&self, filter: &AuthorFilter, item: &ContentItem) -> bool {
        match filter {
            AuthorFilter::Id(id) => item.author_id == *id,
            AuthorFilter::Name(name) => self
                .authors
                .get(&item.author_id)
                .is_some_and(|n| n.eq_ignore_ascii_case(name)),
        }
    }

    fn matches(&self, plan: &QueryPlan, item: &ContentItem) -> bool {
        if !plan.types.accepts(&item.item_type) || !plan.status.accepts(item.status) {
            return false;
        }
        if let Some(author) = &plan.author {
            if !self.author_matches(author, item) {
                return false;
            }
        }
        if !plan.constraints.iter().all(|c| c.matches(&item.attributes)) {
            return false;
        }

        let title = item.title.to_lowercase();
        let body = item.body.to_lowercase();
        plan.search.iter().all(|term| {
            let hit = title.contains(&term.text) || body.contains(&term.text);
            hit != term.exclude
        })
    }
}

impl ContentRepository for InMemoryRepository {
    fn find_by_id(&self, id: ItemId) -> std::result::Result<Option<ContentItem>, RepositoryError> {
        Ok(self.items.iter().find(|i| i.id == id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> std::result::Result<Option<ItemId>, RepositoryError> {
        Ok(self.items.iter().find(|i| i.slug == slug).map(|i| i.id))
    }

    fn find_by_title(&self, title: &str) -> std::result::Result<Option<ItemId>, RepositoryError> {
        Ok(self.items.iter().find(|i| i.title == title).map(|i| i.id))
    }

    fn search(&self, plan: &QueryPlan) -> std::result::Result<SearchResult, RepositoryError> {
        let mut matched: Vec<&ContentItem> = self.items.iter().filter(|i| self.matches(plan, i)).collect();
        matched.sort_by(|a, b| plan.ordering.compare(a, b));

        let total = matched.len() as u64;
        let page = matched.into_iter().skip(plan.offset as usize);
        let ids = match plan.limit() {
            Some(limit) => page.take(limit as usize).map(|i| i.id).collect(),
            None => page.map(|i| i.id).collect(),
        };
        Ok(SearchResult { ids, total })
    }

    fn load_many(&self, ids: &[ItemId]) -> std::result::Result<Vec<ContentItem>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.items.iter().find(|i| i.id == *id).cloned())
            .collect())
    }
}
