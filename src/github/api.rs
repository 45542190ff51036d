//! Remote store seam
//!
//! The contents API behind a trait, so the cache and the sync operations can
//! run against the HTTP client in production and an in-memory store in tests.

use async_trait::async_trait;

use super::errors::GithubError;
use super::types::{Contents, DeleteRequest, PutRequest, WriteResponse};

/// The three contents-API operations the sync core needs.
///
/// Paths are repository-relative. `branch` selects the line of history on
/// reads; writes carry the branch in the request body instead.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Fetch a file entry or a directory listing.
    async fn contents(&self, path: &str, branch: Option<&str>) -> Result<Contents, GithubError>;

    /// Create or replace a file.
    async fn put_contents(
        &self,
        path: &str,
        request: &PutRequest,
    ) -> Result<WriteResponse, GithubError>;

    /// Delete a file.
    async fn delete_contents(
        &self,
        path: &str,
        request: &DeleteRequest,
    ) -> Result<WriteResponse, GithubError>;
}
