//! Query criteria
//!
//! `QueryCriteria` is an immutable value object. It is assembled with the
//! `with_*` builders (or coerced from a raw argument bag, see
//! `crate::query::args`) and handed to `Query::new`, which never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::filter::AttributeFilter;
use super::item::{ContentItem, ContentStatus, ItemId};
use crate::error::{Error, Result};

/// Which content types a query accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    Any,
    One(String),
    Set(BTreeSet<String>),
}

impl TypeFilter {
    /// Build from a list of names; "any" anywhere in the list wins.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.eq_ignore_ascii_case("any") {
                return Self::Any;
            }
            set.insert(name.to_string());
        }
        match set.len() {
            0 => Self::Any,
            1 => Self::One(set.into_iter().next().unwrap_or_default()),
            _ => Self::Set(set),
        }
    }

    pub fn accepts(&self, item_type: &str) -> bool {
        match self {
            Self::Any => true,
            Self::One(t) => t == item_type,
            Self::Set(set) => set.contains(item_type),
        }
    }
}

/// Which publication states a query accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    #[serde(alias = "publish")]
    Published,
    Draft,
    Any,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "published" | "publish" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// `Any` still excludes trashed items.
    pub fn accepts(&self, status: ContentStatus) -> bool {
        match self {
            Self::Published => status == ContentStatus::Published,
            Self::Draft => status == ContentStatus::Draft,
            Self::Any => status != ContentStatus::Trash,
        }
    }
}

/// Author restriction, by id or by login name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    Id(u64),
    Name(String),
}

/// Fields results can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderField {
    #[default]
    #[serde(alias = "date")]
    Created,
    Modified,
    Title,
    Author,
    #[serde(alias = "ID")]
    Id,
}

impl OrderField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" | "date" | "post_date" => Some(Self::Created),
            "modified" | "post_modified" => Some(Self::Modified),
            "title" | "post_title" => Some(Self::Title),
            "author" | "post_author" => Some(Self::Author),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    /// Compare two items on this field alone.
    pub fn compare(&self, a: &ContentItem, b: &ContentItem) -> std::cmp::Ordering {
        match self {
            Self::Created => a.created_at.cmp(&b.created_at),
            Self::Modified => a.modified_at.cmp(&b.modified_at),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::Author => a.author_id.cmp(&b.author_id),
            Self::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Ordering: field plus direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub direction: OrderDirection,
}

impl Ordering {
    pub fn new(field: OrderField, direction: OrderDirection) -> Self {
        Self { field, direction }
    }

    pub fn compare(&self, a: &ContentItem, b: &ContentItem) -> std::cmp::Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            OrderDirection::Asc => ord,
            OrderDirection::Desc => ord.reverse(),
        }
    }
}

/// Page size: a bounded count or unbounded (`-1` in raw form)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Unbounded,
    Limit(u32),
}

impl PageSize {
    /// Raw form: -1 for unbounded, otherwise the limit itself.
    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Unbounded => -1,
            Self::Limit(n) => i64::from(*n),
        }
    }
}

impl TryFrom<i64> for PageSize {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        match raw {
            -1 => Ok(Self::Unbounded),
            n if n < 0 => Err(Error::InvalidCriteria(format!(
                "page size must be -1 or >= 0, got {}",
                n
            ))),
            n => u32::try_from(n)
                .map(Self::Limit)
                .map_err(|_| Error::InvalidCriteria(format!("page size {} is too large", n))),
        }
    }
}

/// Immutable query criteria
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCriteria {
    types: TypeFilter,
    status: Option<StatusFilter>,
    author: Option<AuthorFilter>,
    search: Option<String>,
    ordering: Option<Ordering>,
    page_size: Option<PageSize>,
    page: Option<u32>,
    offset: Option<u64>,
    id: Option<ItemId>,
    slug: Option<String>,
    constraints: Vec<AttributeFilter>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    //=== Builders ===

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.types = TypeFilter::from_names([item_type.into()]);
        self
    }

    pub fn with_types(mut self, types: TypeFilter) -> Self {
        self.types = types;
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_author(mut self, author: AuthorFilter) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    pub fn with_ordering(mut self, field: OrderField, direction: OrderDirection) -> Self {
        self.ordering = Some(Ordering::new(field, direction));
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Raw page size; rejects negatives other than -1.
    pub fn with_per_page(self, raw: i64) -> Result<Self> {
        Ok(self.with_page_size(PageSize::try_from(raw)?))
    }

    /// 1-based page number; 0 is read as 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1));
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_constraint(mut self, constraint: AttributeFilter) -> Self {
        self.constraints.push(constraint);
        self
    }

    //=== Accessors ===

    pub fn types(&self) -> &TypeFilter {
        &self.types
    }

    /// Explicit status, if one was given
    pub fn status(&self) -> Option<StatusFilter> {
        self.status
    }

    pub fn author(&self) -> Option<&AuthorFilter> {
        self.author.as_ref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn ordering(&self) -> Option<Ordering> {
        self.ordering
    }

    pub fn page_size(&self) -> Option<PageSize> {
        self.page_size
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn constraints(&self) -> &[AttributeFilter] {
        &self.constraints
    }

    /// True when the criteria name one item (by id or slug)
    pub fn is_singular(&self) -> bool {
        self.id.is_some() || self.slug.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_filter_from_names() {
        assert_eq!(TypeFilter::from_names(["article"]), TypeFilter::One("article".to_string()));
        assert_eq!(TypeFilter::from_names(["article", "any"]), TypeFilter::Any);
        assert_eq!(TypeFilter::from_names(Vec::<String>::new()), TypeFilter::Any);

        let set = TypeFilter::from_names(["page", "article", "page"]);
        assert!(matches!(set, TypeFilter::Set(ref s) if s.len() == 2));
        assert!(set.accepts("page"));
        assert!(!set.accepts("event"));
    }

    #[test]
    fn test_status_filter_accepts() {
        assert!(StatusFilter::Published.accepts(ContentStatus::Published));
        assert!(!StatusFilter::Published.accepts(ContentStatus::Draft));
        assert!(StatusFilter::Draft.accepts(ContentStatus::Draft));
        assert!(StatusFilter::Any.accepts(ContentStatus::Private));
        assert!(!StatusFilter::Any.accepts(ContentStatus::Trash));
    }

    #[test]
    fn test_page_size_try_from() {
        assert_eq!(PageSize::try_from(-1).unwrap(), PageSize::Unbounded);
        assert_eq!(PageSize::try_from(0).unwrap(), PageSize::Limit(0));
        assert_eq!(PageSize::try_from(25).unwrap(), PageSize::Limit(25));
        assert!(matches!(PageSize::try_from(-2), Err(Error::InvalidCriteria(_))));
        assert_eq!(PageSize::Unbounded.as_raw(), -1);
    }

    #[test]
    fn test_with_per_page_rejects_negative() {
        assert!(QueryCriteria::new().with_per_page(-5).is_err());
        let criteria = QueryCriteria::new().with_per_page(-1).unwrap();
        assert_eq!(criteria.page_size(), Some(PageSize::Unbounded));
    }

    #[test]
    fn test_page_zero_reads_as_one() {
        assert_eq!(QueryCriteria::new().with_page(0).page(), 1);
        assert_eq!(QueryCriteria::new().page(), 1);
    }

    #[test]
    fn test_blank_search_is_dropped() {
        assert_eq!(QueryCriteria::new().with_search("   ").search(), None);
        assert_eq!(QueryCriteria::new().with_search("rust").search(), Some("rust"));
    }

    #[test]
    fn test_ordering_direction() {
        let a = ContentItem::new(1, "article", "Alpha");
        let b = ContentItem::new(2, "article", "beta");
        let asc = Ordering::new(OrderField::Title, OrderDirection::Asc);
        let desc = Ordering::new(OrderField::Title, OrderDirection::Desc);
        assert!(asc.compare(&a, &b).is_lt());
        assert!(desc.compare(&a, &b).is_gt());
    }

    #[test]
    fn test_is_singular() {
        assert!(QueryCriteria::new().with_id(3).is_singular());
        assert!(QueryCriteria::new().with_slug("about").is_singular());
        assert!(!QueryCriteria::new().with_type("article").is_singular());
    }
}
