//! GitHub contents API client
//!
//! Authenticated access to the repository contents endpoints. The bearer
//! token is read from the persisted session on every call; a 401 response
//! raises the re-login prompt before the failing call is surfaced, so the
//! caller retries manually after re-authenticating.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

use super::api::ContentsApi;
use super::errors::GithubError;
use super::session::SessionStore;
use super::types::{Contents, DeleteRequest, PutRequest, WriteResponse};

/// GitHub API base URL
const GITHUB_API_URL: &str = "https://api.github.com/";

/// User-facing prompt raised when the remote rejects the session.
///
/// Consent only controls whether the authorization URL is surfaced; the
/// failing call returns an error either way and must be retried after the
/// re-login completes.
pub trait ReauthPrompt: Send + Sync {
    /// Ask whether to start a fresh login
    fn confirm_relogin(&self) -> bool;
    /// Hand over the authorization URL for the user to open
    fn open_login(&self, url: &str);
}

/// Client for the repository contents API
pub struct GithubClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Repository coordinates and placeholder values
    config: Config,
    /// Persisted login session, read per request
    session: SessionStore,
    /// Re-login prompt raised on 401
    reauth: Arc<dyn ReauthPrompt>,
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GithubClient {
    /// Create a client for the configured repository
    pub fn new(
        config: Config,
        session: SessionStore,
        reauth: Arc<dyn ReauthPrompt>,
    ) -> Result<Self, GithubError> {
        // No request timeout: a hung call blocks only its own operation
        let http_client = Client::builder()
            .user_agent(concat!("gitdoc/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            config,
            session,
            reauth,
        })
    }

    /// Issue one API request and parse the JSON response.
    ///
    /// Placeholders in `api_path` are substituted from configuration before
    /// dispatch; an unresolved placeholder fails here without touching the
    /// network.
    async fn request<B, T>(
        &self,
        method: Method,
        api_path: &str,
        body: Option<&B>,
    ) -> Result<T, GithubError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resolved = self.config.replace_placeholders(api_path)?;
        let url = format!("{}{}", GITHUB_API_URL, resolved);

        debug!(method = %method, url = %url, "Dispatching contents request");

        let mut request = self
            .http_client
            .request(method, &url)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = self.session.load() {
            request = request.header("Authorization", format!("token {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.handle_error_status(status.as_u16(), &body));
        }

        Ok(response.json::<T>().await?)
    }

    /// Map a failed response to an error, raising the re-login prompt on 401
    fn handle_error_status(&self, status: u16, body: &str) -> GithubError {
        let message = error_message(body);
        if status == 401 {
            warn!("Session rejected by the remote, prompting for re-login");
            if self.reauth.confirm_relogin() {
                self.reauth.open_login(&self.config.authorization_url());
            }
        }
        GithubError::from_status(status, &message)
    }
}

#[async_trait]
impl ContentsApi for GithubClient {
    async fn contents(&self, path: &str, branch: Option<&str>) -> Result<Contents, GithubError> {
        let api_path = contents_path(path, branch);
        self.request::<(), Contents>(Method::GET, &api_path, None)
            .await
    }

    async fn put_contents(
        &self,
        path: &str,
        request: &PutRequest,
    ) -> Result<WriteResponse, GithubError> {
        // Writes name the branch in the body, not the URL
        let api_path = contents_path(path, None);
        self.request(Method::PUT, &api_path, Some(request)).await
    }

    async fn delete_contents(
        &self,
        path: &str,
        request: &DeleteRequest,
    ) -> Result<WriteResponse, GithubError> {
        let api_path = contents_path(path, None);
        self.request(Method::DELETE, &api_path, Some(request)).await
    }
}

/// Build the contents endpoint path, still carrying the config placeholders
fn contents_path(path: &str, branch: Option<&str>) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let mut full = format!("repos/$OWNER/$REPO/contents/{}", encoded.join("/"));
    if let Some(branch) = branch {
        full.push_str("?ref=");
        full.push_str(&urlencoding::encode(branch));
    }
    full
}

/// Pull the server's message out of an error body, falling back to the raw
/// text for non-JSON responses
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}
