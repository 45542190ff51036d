//! Synchronization operations
//!
//! The four mutating operations against the remote store. Each follows the
//! same protocol: validate preconditions, perform the remote write, then
//! patch the cache with the known-correct result. The cache is never
//! touched before the write is confirmed, and nothing retries on failure;
//! remote errors propagate with the server's own message.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{Address, ContentsCache};
use crate::github::encode;
use crate::github::{
    Contents, ContentsApi, DeleteRequest, Entry, GithubError, PutRequest, WriteResponse,
};

use super::document::{CommitPrompt, EditorDocument};

/// The sync operations, bound to one repository branch
pub struct SyncOps {
    /// Remote store for writes and the upload listing probe
    api: Arc<dyn ContentsApi>,
    /// Shared contents cache, patched after confirmed writes
    cache: Arc<ContentsCache>,
    /// Commit-message prompt for saves
    prompt: Arc<dyn CommitPrompt>,
    /// Branch every operation targets
    branch: String,
}

impl SyncOps {
    pub fn new(
        api: Arc<dyn ContentsApi>,
        cache: Arc<ContentsCache>,
        prompt: Arc<dyn CommitPrompt>,
        branch: &str,
    ) -> Self {
        Self {
            api,
            cache,
            prompt,
            branch: branch.to_string(),
        }
    }

    /// Commit the open document over an existing file.
    ///
    /// Prompts for a commit message (declining aborts with `Ok(None)` and no
    /// side effects), obtains the current version token by read-through at
    /// the file's address, writes, and on success marks the document saved
    /// and patches the file's cache record to the server metadata with the
    /// content actually sent. Returns the patched entry.
    pub async fn save(
        &self,
        document: &mut dyn EditorDocument,
        path: &str,
    ) -> Result<Option<Entry>, GithubError> {
        let default_message = format!("Edited {}", path);
        let message = match self.prompt.commit_message(&default_message) {
            Some(message) if !message.is_empty() => message,
            _ => {
                info!(path = %path, "Save aborted at the commit prompt");
                return Ok(None);
            }
        };

        let address = Address::new(path, &self.branch);
        // Read-through: a cold cache costs one fetch, then the token is known
        let sha = match self.cache.read(&address).await? {
            Contents::File(entry) => entry.sha,
            Contents::Dir(_) => {
                return Err(GithubError::Decode(format!(
                    "{} is a directory, not a file",
                    path
                )));
            }
        };

        let serialized = document.serialize();
        let request = PutRequest {
            message,
            branch: Some(self.branch.clone()),
            content: encode::encode(&serialized),
            sha: Some(sha),
        };

        let WriteResponse { content, commit } = self.api.put_contents(path, &request).await?;
        let server_entry = content.ok_or_else(|| {
            GithubError::Decode("Write response carried no content metadata".to_string())
        })?;

        document.mark_saved(&serialized);

        // Keep the server's metadata but the content we actually sent; the
        // write response omits the content field
        let entry = Entry {
            content: Some(request.content),
            ..server_entry
        };
        self.cache
            .patch(&address, |_| Some(Contents::File(entry.clone())));

        info!(path = %path, commit = %commit.sha, "Saved document");
        Ok(Some(entry))
    }

    /// Create a file at `base_path/name`.
    ///
    /// No version token is sent: creating assumes no prior version, and a
    /// collision with an existing path is a write conflict from the remote.
    /// On success the parent's cached listing gains the new entry at its
    /// sorted position without a refetch.
    pub async fn create(
        &self,
        base_path: &str,
        name: &str,
        initial_content: &str,
    ) -> Result<WriteResponse, GithubError> {
        let path = format!("{}/{}", base_path, name);
        let request = PutRequest {
            message: format!("Creating {}", path),
            branch: Some(self.branch.clone()),
            content: encode::encode(initial_content),
            sha: None,
        };

        let response = self.api.put_contents(&path, &request).await?;

        if let Some(entry) = response.content.clone() {
            let parent = Address::new(base_path, &self.branch);
            self.cache.patch(&parent, |current| {
                let mut entries = match current {
                    Some(Contents::Dir(entries)) => entries,
                    // A never-cached parent materializes as just this entry
                    _ => Vec::new(),
                };
                insert_sorted(&mut entries, entry);
                Some(Contents::Dir(entries))
            });
        }

        info!(path = %path, commit = %response.commit.sha, "Created file");
        Ok(response)
    }

    /// Delete the file at `path`, which must carry its current version
    /// token.
    ///
    /// On success the parent's cached listing drops the matching name; a
    /// listing without that name is left unchanged, and a parent that was
    /// never listed stays uncached.
    pub async fn delete(&self, path: &str, sha: &str) -> Result<(), GithubError> {
        let request = DeleteRequest {
            message: format!("Deleting {}", path),
            branch: Some(self.branch.clone()),
            sha: sha.to_string(),
        };

        let response = self.api.delete_contents(path, &request).await?;

        let name = base_name(path).to_string();
        let parent = Address::new(parent_path(path), &self.branch);
        self.cache.patch(&parent, |current| match current {
            Some(Contents::Dir(mut entries)) => {
                if let Some(position) = entries.iter().position(|e| e.name == name) {
                    entries.remove(position);
                }
                Some(Contents::Dir(entries))
            }
            other => other,
        });

        info!(path = %path, commit = %response.commit.sha, "Deleted file");
        Ok(())
    }

    /// Attach an asset under `base_path/figures`, resolving name collisions
    /// with `_2`, `_3`, … suffixes.
    ///
    /// Returns the path relative to the document (`figures/<final-name>`)
    /// for embedding. The listing probe goes straight to the remote, not
    /// through the cache: the cached figures listing may be a partial one
    /// materialized by an earlier create.
    pub async fn upload(
        &self,
        base_path: &str,
        name: &str,
        content: &str,
    ) -> Result<String, GithubError> {
        let figure_path = format!("{}/figures", base_path);

        // Any listing failure counts as an empty directory
        let existing: Vec<String> = match self.api.contents(&figure_path, Some(&self.branch)).await
        {
            Ok(Contents::Dir(entries)) => entries.into_iter().map(|e| e.path).collect(),
            Ok(Contents::File(_)) => Vec::new(),
            Err(err) => {
                debug!(path = %figure_path, error = %err, "No existing figure listing");
                Vec::new()
            }
        };

        let mut suffix = 0u32;
        let final_name = loop {
            let candidate = candidate_name(name, suffix);
            let candidate_path = format!("{}/{}", figure_path, candidate);
            if !existing.contains(&candidate_path) {
                break candidate;
            }
            suffix += 1;
        };

        let response = self.create(&figure_path, &final_name, content).await?;

        let created = response
            .content
            .map(|entry| entry.name)
            .unwrap_or(final_name);
        Ok(format!("figures/{}", created))
    }
}

/// Insert preserving ascending name order: the first position whose entry
/// name compares greater, or the end
fn insert_sorted(entries: &mut Vec<Entry>, entry: Entry) {
    let position = entries
        .iter()
        .position(|existing| entry.name < existing.name)
        .unwrap_or(entries.len());
    entries.insert(position, entry);
}

/// Parent directory of `path`; "" names the repository root
fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Collision candidate for `name`: the bare name first, then `_2`, `_3`, …
/// before the extension
fn candidate_name(name: &str, suffix: u32) -> String {
    if suffix == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, suffix + 1, ext),
        None => format!("{}_{}", name, suffix + 1),
    }
}
