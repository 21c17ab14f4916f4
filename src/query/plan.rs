//! Normalized query plans and pagination math.

use crate::config::QueryConfig;
use crate::domain::{
    AttributeFilter, AuthorFilter, Ordering, PageSize, QueryCriteria, StatusFilter, TypeFilter,
};

/// A search term; `-term` excludes instead of requiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub text: String,
    pub exclude: bool,
}

/// Criteria with every default applied and pagination resolved
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub types: TypeFilter,
    pub status: StatusFilter,
    pub author: Option<AuthorFilter>,
    pub search: Vec<SearchTerm>,
    pub ordering: Ordering,
    pub constraints: Vec<AttributeFilter>,
    pub page_size: PageSize,
    pub page: u32,
    pub offset: u64,
}

impl QueryPlan {
    pub fn build(criteria: &QueryCriteria, defaults: &QueryConfig) -> Self {
        let page_size = criteria
            .page_size()
            .unwrap_or(PageSize::Limit(defaults.default_page_size));
        let page = criteria.page();
        let offset = resolve_offset(page, page_size, criteria.offset());

        Self {
            types: criteria.types().clone(),
            status: criteria.status().unwrap_or(defaults.default_status),
            author: criteria.author().cloned(),
            search: criteria.search().map(parse_search).unwrap_or_default(),
            ordering: criteria
                .ordering()
                .unwrap_or(Ordering::new(defaults.default_order_by, defaults.default_order)),
            constraints: criteria.constraints().to_vec(),
            page_size,
            page,
            offset,
        }
    }

    /// Maximum number of items on one page; `None` when unbounded or 0
    pub fn limit(&self) -> Option<u64> {
        match self.page_size {
            PageSize::Unbounded | PageSize::Limit(0) => None,
            PageSize::Limit(n) => Some(u64::from(n)),
        }
    }

    pub fn page_count(&self, found: u64) -> u64 {
        page_count(found, self.page_size.as_raw())
    }
}

/// `ceil(found / page_size)`; 1 when unbounded (any size <= 0) or nothing
/// was found.
pub fn page_count(found: u64, page_size: i64) -> u64 {
    if page_size <= 0 || found == 0 {
        return 1;
    }
    found.div_ceil(page_size as u64)
}

/// An explicit offset wins; otherwise pages past the first skip
/// `(page - 1) * page_size` items.
pub fn resolve_offset(page: u32, page_size: PageSize, explicit: Option<u64>) -> u64 {
    if let Some(offset) = explicit {
        return offset;
    }
    match page_size {
        PageSize::Limit(n) if page > 1 && n > 0 => u64::from(page - 1) * u64::from(n),
        _ => 0,
    }
}

/// Split a search string into terms. Double-quoted phrases stay together
/// and a leading '-' marks a term as excluded.
pub fn parse_search(input: &str) -> Vec<SearchTerm> {
    let mut terms = Vec::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let (exclude, body) = match rest.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, rest),
        };

        let (text, remainder) = if let Some(quoted) = body.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match body.find(char::is_whitespace) {
                Some(end) => (&body[..end], &body[end..]),
                None => (body, ""),
            }
        };

        let text = text.trim();
        if !text.is_empty() {
            terms.push(SearchTerm {
                text: text.to_lowercase(),
                exclude,
            });
        }
        rest = remainder.trim_start();
    }
    terms
}
