//! Content item as the loop sees it
//!
//! A `ContentItem` is produced once at the repository boundary and never
//! mutated by the core. Loops share it through `Rc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a content item in the backing store
pub type ItemId = u64;

/// Publication status of a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[serde(alias = "publish")]
    Published,
    Draft,
    Pending,
    Private,
    Trash,
}

impl ContentStatus {
    /// Parse a status name, accepting the legacy `publish` spelling
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "published" | "publish" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "private" => Some(Self::Private),
            "trash" => Some(Self::Trash),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Trash => "trash",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A materialized content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    //=== Identity ===
    pub id: ItemId,

    /// Content type identifier ("article", "page", ...)
    #[serde(rename = "type")]
    pub item_type: String,

    pub slug: String,

    //=== Content ===
    pub status: ContentStatus,
    pub title: String,
    pub body: String,
    pub author_id: u64,

    /// Free-form attributes that attribute constraints are evaluated against
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,

    //=== Timestamps ===
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create a published item with the given identity; timestamps are now.
    pub fn new(id: ItemId, item_type: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id,
            item_type: item_type.into(),
            slug: slugify(&title),
            status: ContentStatus::Published,
            title,
            body: String::new(),
            author_id: 0,
            attributes: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_author(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        if self.modified_at < created_at {
            self.modified_at = created_at;
        }
        self
    }

    pub fn with_modified(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Derive a slug from a title: lowercase ASCII alphanumerics joined by '-'
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
