//! Document storage collaborators.
//!
//! A [`DocumentStore`] accepts full snapshots and hands them back by id.
//! Saves overwrite, so repeating one is harmless.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use builder_core::DocumentSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PersistenceError, PersistenceResult};

/// Acknowledgement of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// Document that was written.
    pub document_id: String,
    /// When the store accepted it.
    pub saved_at: DateTime<Utc>,
    /// Optional message from the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveReceipt {
    /// Receipt stamped with the current time.
    #[must_use]
    pub fn now(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            saved_at: Utc::now(),
            message: None,
        }
    }
}

/// Backend that persists document snapshots.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a snapshot, replacing whatever was stored under the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or refuses the write.
    async fn save(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
    ) -> PersistenceResult<SaveReceipt>;

    /// Read the snapshot stored under the id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if nothing is stored under the
    /// id, or another error if the store is unreachable.
    async fn load(&self, document_id: &str) -> PersistenceResult<DocumentSnapshot>;
}

/// Stores each document as a pretty-printed JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Store rooted at `root`. The directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a document id.
    #[must_use]
    pub fn path_for(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_id(document_id)))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn save(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
    ) -> PersistenceResult<SaveReceipt> {
        let json = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Write beside the target, then rename, so readers never see a torn file.
        let path = self.path_for(document_id);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!("Saved document {document_id} to {}", path.display());
        Ok(SaveReceipt::now(document_id))
    }

    async fn load(&self, document_id: &str) -> PersistenceResult<DocumentSnapshot> {
        let path = self.path_for(document_id);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(document_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }
}

/// Map a document id onto a file stem, one stem per id.
///
/// Lowercase ASCII letters, digits, `-` and `_` are kept; every other byte
/// (uppercase letters included, so case-folding file systems keep ids apart)
/// is written as `%XX`. The empty id maps to `%`.
fn encode_id(document_id: &str) -> String {
    if document_id.is_empty() {
        return "%".to_string();
    }
    let mut stem = String::with_capacity(document_id.len());
    for byte in document_id.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => stem.push(char::from(byte)),
            other => {
                let _ = write!(stem, "%{other:02X}");
            }
        }
    }
    stem
}
