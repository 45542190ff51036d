//! In-memory contents store for tests
//!
//! Implements [`ContentsApi`] over a locked map, enforcing the same sha
//! discipline as the real store: a write against an existing path must carry
//! the current version token, a create must carry none. Every call and every
//! write's commit message is recorded so tests can assert that no read was
//! issued after a write and that the intended message went out.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::api::ContentsApi;
use super::errors::GithubError;
use super::types::{CommitInfo, Contents, DeleteRequest, Entry, PutRequest, WriteResponse};

/// One stored file
struct StoredFile {
    content: String,
    sha: String,
}

/// In-memory implementation of the contents API
pub struct MemoryContents {
    files: Mutex<HashMap<String, StoredFile>>,
    calls: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
    counter: AtomicU64,
}

impl MemoryContents {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Insert a file directly, bypassing the sha discipline. Returns the
    /// assigned version token.
    pub fn seed(&self, path: &str, content: &str) -> String {
        let sha = self.next_token("sha");
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        sha
    }

    /// Every API call so far, in order, as "METHOD path" strings
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Commit messages carried by write calls so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// The current version token for a path, if the file exists
    pub fn sha_of(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|f| f.sha.clone())
    }

    fn record(&self, method: &str, path: &str) {
        self.calls.lock().unwrap().push(format!("{} {}", method, path));
    }

    fn record_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn next_token(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn file_entry(path: &str, sha: &str, content: Option<String>) -> Entry {
        Entry {
            name: base_name(path).to_string(),
            path: path.to_string(),
            sha: sha.to_string(),
            content,
            kind: "file".to_string(),
        }
    }
}

impl Default for MemoryContents {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentsApi for MemoryContents {
    async fn contents(&self, path: &str, _branch: Option<&str>) -> Result<Contents, GithubError> {
        self.record("GET", path);
        let files = self.files.lock().unwrap();

        if let Some(file) = files.get(path) {
            return Ok(Contents::File(Self::file_entry(
                path,
                &file.sha,
                Some(file.content.clone()),
            )));
        }

        // Derive a directory listing from immediate children
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        let mut children: BTreeMap<String, Entry> = BTreeMap::new();
        for (stored_path, file) in files.iter() {
            let Some(rest) = stored_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                None => {
                    // Listing entries carry no content, matching the remote
                    children.insert(
                        rest.to_string(),
                        Self::file_entry(stored_path, &file.sha, None),
                    );
                }
                Some((dir_name, _)) => {
                    children.insert(
                        dir_name.to_string(),
                        Entry {
                            name: dir_name.to_string(),
                            path: format!("{}{}", prefix, dir_name),
                            sha: format!("tree-{}", dir_name),
                            content: None,
                            kind: "dir".to_string(),
                        },
                    );
                }
            }
        }

        if children.is_empty() {
            return Err(GithubError::NotFound("Not Found".to_string()));
        }
        Ok(Contents::Dir(children.into_values().collect()))
    }

    async fn put_contents(
        &self,
        path: &str,
        request: &PutRequest,
    ) -> Result<WriteResponse, GithubError> {
        self.record("PUT", path);
        self.record_message(&request.message);
        let mut files = self.files.lock().unwrap();

        match (files.get(path), &request.sha) {
            (Some(existing), Some(sha)) if *sha == existing.sha => {}
            (None, None) => {}
            (Some(_), _) => {
                return Err(GithubError::WriteConflict(format!(
                    "{} does not match",
                    path
                )));
            }
            (None, Some(_)) => {
                return Err(GithubError::WriteConflict(format!(
                    "{} does not exist",
                    path
                )));
            }
        }

        let sha = self.next_token("sha");
        files.insert(
            path.to_string(),
            StoredFile {
                content: request.content.clone(),
                sha: sha.clone(),
            },
        );

        // Write responses omit the content field, as the remote does
        Ok(WriteResponse {
            content: Some(Self::file_entry(path, &sha, None)),
            commit: CommitInfo {
                sha: self.next_token("commit"),
            },
        })
    }

    async fn delete_contents(
        &self,
        path: &str,
        request: &DeleteRequest,
    ) -> Result<WriteResponse, GithubError> {
        self.record("DELETE", path);
        self.record_message(&request.message);
        let mut files = self.files.lock().unwrap();

        match files.get(path) {
            None => Err(GithubError::NotFound("Not Found".to_string())),
            Some(existing) if existing.sha != request.sha => Err(GithubError::WriteConflict(
                format!("{} does not match", path),
            )),
            Some(_) => {
                files.remove(path);
                Ok(WriteResponse {
                    content: None,
                    commit: CommitInfo {
                        sha: self.next_token("commit"),
                    },
                })
            }
        }
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_derived_from_children() {
        let store = MemoryContents::new();
        store.seed("docs/z.md", "eg==");
        store.seed("docs/a.md", "YQ==");
        store.seed("docs/figures/img.png", "aW1n");

        let contents = store.contents("docs", None).await.unwrap();
        let entries = contents.as_dir().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "figures", "z.md"]);
        assert!(entries[1].is_dir());
        assert_eq!(entries[0].content, None);
    }

    #[tokio::test]
    async fn test_file_fetch_carries_content() {
        let store = MemoryContents::new();
        let sha = store.seed("docs/a.md", "YQ==");

        let contents = store.contents("docs/a.md", None).await.unwrap();
        let entry = contents.as_file().unwrap();
        assert_eq!(entry.sha, sha);
        assert_eq!(entry.content.as_deref(), Some("YQ=="));
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let store = MemoryContents::new();
        let err = store.contents("nope", None).await.unwrap_err();
        assert!(matches!(err, GithubError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_put_enforces_sha_discipline() {
        let store = MemoryContents::new();
        let sha = store.seed("a.md", "YQ==");

        // Update without the current sha is a conflict
        let stale = PutRequest {
            message: "m".to_string(),
            branch: None,
            content: "Yg==".to_string(),
            sha: Some("bogus".to_string()),
        };
        let err = store.put_contents("a.md", &stale).await.unwrap_err();
        assert!(matches!(err, GithubError::WriteConflict(_)));

        // Create over an existing path is a conflict
        let create = PutRequest {
            message: "m".to_string(),
            branch: None,
            content: "Yg==".to_string(),
            sha: None,
        };
        let err = store.put_contents("a.md", &create).await.unwrap_err();
        assert!(matches!(err, GithubError::WriteConflict(_)));

        // Update with the current sha succeeds and rotates the token
        let update = PutRequest {
            message: "m".to_string(),
            branch: None,
            content: "Yg==".to_string(),
            sha: Some(sha.clone()),
        };
        let resp = store.put_contents("a.md", &update).await.unwrap();
        let new_sha = resp.content.unwrap().sha;
        assert_ne!(new_sha, sha);
        assert_eq!(store.sha_of("a.md"), Some(new_sha));
    }

    #[tokio::test]
    async fn test_delete_requires_matching_sha() {
        let store = MemoryContents::new();
        let sha = store.seed("a.md", "YQ==");

        let stale = DeleteRequest {
            message: "m".to_string(),
            branch: None,
            sha: "bogus".to_string(),
        };
        assert!(store.delete_contents("a.md", &stale).await.is_err());

        let ok = DeleteRequest {
            message: "m".to_string(),
            branch: None,
            sha,
        };
        store.delete_contents("a.md", &ok).await.unwrap();
        assert!(store.sha_of("a.md").is_none());
    }
}
