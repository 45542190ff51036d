//! GitHub contents API types
//!
//! Defines the wire shapes for contents reads and writes. The contents API
//! returns a single JSON object for a file and a JSON array for a directory
//! listing, so reads deserialize through the untagged [`Contents`] enum.

use serde::{Deserialize, Serialize};

use super::encode;

/// One file or directory child as reported by the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    /// Name segment (not the full path)
    pub name: String,
    /// Full path from the repository root
    pub path: String,
    /// Version token: changes on every content change, required for
    /// conflict-safe writes
    pub sha: String,
    /// Base64 content, present only on single-file fetches
    #[serde(default)]
    pub content: Option<String>,
    /// Entry type: "file" or "dir"
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entry {
    /// Check if this entry represents a directory
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }

    /// Whether the stored content equals `text` once encoded.
    ///
    /// The remote hard-wraps base64 content with newlines, so the stored
    /// form is normalized before comparing. An entry without content never
    /// matches.
    pub fn content_matches(&self, text: &str) -> bool {
        match self.content.as_deref() {
            Some(stored) => {
                let normalized: String = stored.split_whitespace().collect();
                normalized == encode::encode(text)
            }
            None => false,
        }
    }
}

/// A contents record: one file entry or a directory listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    /// Single-file fetch result
    File(Entry),
    /// Directory listing, ordered by name ascending
    Dir(Vec<Entry>),
}

impl Contents {
    /// The file entry, if this record is a single file
    pub fn as_file(&self) -> Option<&Entry> {
        match self {
            Contents::File(entry) => Some(entry),
            Contents::Dir(_) => None,
        }
    }

    /// The listing slice, if this record is a directory
    pub fn as_dir(&self) -> Option<&[Entry]> {
        match self {
            Contents::File(_) => None,
            Contents::Dir(entries) => Some(entries),
        }
    }
}

/// Request body for `PUT contents/{path}` (create and save)
#[derive(Debug, Serialize)]
pub struct PutRequest {
    /// Commit message
    pub message: String,
    /// Target branch; the write path carries the branch in the body,
    /// not in the URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Base64 file content
    pub content: String,
    /// Version token of the entry being replaced; absent on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Request body for `DELETE contents/{path}`
#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    /// Commit message
    pub message: String,
    /// Target branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Version token of the entry being deleted (mandatory)
    pub sha: String,
}

/// Response body shared by PUT and DELETE writes
#[derive(Debug, Clone, Deserialize)]
pub struct WriteResponse {
    /// Updated entry metadata; null on delete
    #[serde(default)]
    pub content: Option<Entry>,
    /// The commit the write produced
    pub commit: CommitInfo,
}

/// Commit metadata from a write response
#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    /// Commit sha
    pub sha: String,
}
