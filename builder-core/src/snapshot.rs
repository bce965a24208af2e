//! Portable document snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuilderResult, Element};

/// Version tag written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Document-level metadata stored beside the elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Document title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Short summary.
    pub excerpt: String,
    /// Category name.
    pub category: String,
    /// Author display name.
    pub author_name: String,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl DocumentMetadata {
    /// Metadata with a title and a slug derived from it.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            ..Self::default()
        }
    }
}

/// Full capture of a document: metadata plus an ordered element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    /// Format version.
    pub version: String,
    /// Document metadata.
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Elements in store insertion order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
}

impl DocumentSnapshot {
    /// Create a snapshot of the given elements.
    #[must_use]
    pub fn new(metadata: DocumentMetadata, elements: Vec<Element>, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            metadata,
            elements,
            exported_at,
        }
    }

    /// An empty document.
    #[must_use]
    pub fn empty(metadata: DocumentMetadata) -> Self {
        Self::new(metadata, Vec::new(), Utc::now())
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or names an unknown
    /// element type.
    pub fn from_json(json: &str) -> BuilderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> BuilderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Turn a title into a URL slug.
///
/// Lower-cases, drops anything that is not a word character, whitespace or
/// hyphen, then joins words with single hyphens.
#[must_use]
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}
