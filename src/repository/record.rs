//! Stored record normalization.
//!
//! Records arrive in either of two naming schemes: this runtime's own
//! (`title`, `body`, `created_at`, ...) or the legacy template API's
//! (`post_title`, `post_content`, `post_date`, ...). Serde aliases fold both
//! into `RawItem`, which is converted once into a `ContentItem`; nothing past
//! this point branches on the record's shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::RepositoryError;
use crate::domain::{ContentItem, ContentStatus, ItemId, slugify};

/// A stored record before normalization
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(alias = "ID")]
    pub id: ItemId,

    #[serde(rename = "type", alias = "post_type", default = "default_type")]
    pub item_type: String,

    #[serde(alias = "post_status", default)]
    pub status: Option<String>,

    #[serde(alias = "post_title", default)]
    pub title: String,

    #[serde(alias = "post_content", default)]
    pub body: String,

    #[serde(alias = "post_author", default)]
    pub author_id: u64,

    #[serde(alias = "post_name", default)]
    pub slug: Option<String>,

    #[serde(alias = "post_date", default)]
    pub created_at: Option<String>,

    #[serde(alias = "post_modified", default)]
    pub modified_at: Option<String>,

    #[serde(alias = "meta", default)]
    pub attributes: BTreeMap<String, Value>,
}

fn default_type() -> String {
    "post".to_string()
}

/// An author known to the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(alias = "user_login")]
    pub name: String,
}

/// On-disk content fixture: authors and items
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentFixture {
    pub authors: Vec<Author>,
    #[serde(alias = "posts")]
    pub items: Vec<RawItem>,
}

impl TryFrom<RawItem> for ContentItem {
    type Error = RepositoryError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        let status = match raw.status.as_deref() {
            None => ContentStatus::Published,
            Some(s) => ContentStatus::parse(s)
                .ok_or_else(|| RepositoryError::Malformed(format!("item {}: unknown status '{}'", raw.id, s)))?,
        };

        let created_at = match raw.created_at.as_deref() {
            Some(s) => parse_timestamp(s).map_err(|e| RepositoryError::Malformed(format!("item {}: {}", raw.id, e)))?,
            None => DateTime::<Utc>::default(),
        };
        let modified_at = match raw.modified_at.as_deref() {
            Some(s) => parse_timestamp(s).map_err(|e| RepositoryError::Malformed(format!("item {}: {}", raw.id, e)))?,
            None => created_at,
        };

        let slug = match raw.slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => slugify(&raw.title),
        };

        Ok(ContentItem {
            id: raw.id,
            item_type: raw.item_type,
            slug,
            status,
            title: raw.title,
            body: raw.body,
            author_id: raw.author_id,
            attributes: raw.attributes,
            created_at,
            modified_at,
        })
    }
}

/// Accepts RFC 3339 or the legacy `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("unparsable timestamp '{}'", value))
}
