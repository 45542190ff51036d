//! Repository configuration
//!
//! Coordinates of the backing repository, read from the environment. The
//! owner and repository names double as values for the `$OWNER` and
//! `$REPO` placeholders in request path templates.

use std::env;

use crate::github::GithubError;

/// Branch used when `GITDOC_BRANCH` is not set
const DEFAULT_BRANCH: &str = "master";

/// Repository coordinates and OAuth client
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository owner, substituted for `$OWNER`
    pub owner: String,
    /// Repository name, substituted for `$REPO`
    pub repo: String,
    /// Branch all reads and writes target
    pub branch: String,
    /// OAuth application client id for the re-login flow
    pub client_id: Option<String>,
}

impl Config {
    /// Read configuration from `GITDOC_*` environment variables.
    ///
    /// `GITDOC_OWNER` and `GITDOC_REPO` are required; the branch falls back
    /// to `master` and the client id is optional.
    pub fn from_env() -> Result<Self, GithubError> {
        let owner = require_env("GITDOC_OWNER")?;
        let repo = require_env("GITDOC_REPO")?;
        let branch = env::var("GITDOC_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string());
        let client_id = env::var("GITDOC_CLIENT_ID").ok();

        Ok(Self {
            owner,
            repo,
            branch,
            client_id,
        })
    }

    /// Substitute `$NAME` placeholders in a request path.
    ///
    /// A placeholder is a `$` followed by a run of uppercase letters or
    /// underscores; a bare `$` passes through untouched. A placeholder with
    /// no configured value is a configuration error, caught before the
    /// request leaves the process.
    pub fn replace_placeholders(&self, path: &str) -> Result<String, GithubError> {
        let mut resolved = String::with_capacity(path.len());
        let mut rest = path;

        while let Some(start) = rest.find('$') {
            resolved.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find(|c: char| !(c.is_ascii_uppercase() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..end];
            if name.is_empty() {
                resolved.push('$');
                rest = after;
                continue;
            }
            resolved.push_str(self.placeholder(name)?);
            rest = &after[end..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }

    fn placeholder(&self, name: &str) -> Result<&str, GithubError> {
        match name {
            "OWNER" => Ok(&self.owner),
            "REPO" => Ok(&self.repo),
            _ => Err(GithubError::Config(format!(
                "Unresolved placeholder ${} in request path",
                name
            ))),
        }
    }

    /// URL the user opens to authorize a fresh login
    pub fn authorization_url(&self) -> String {
        match &self.client_id {
            Some(client_id) => format!(
                "https://github.com/login/oauth/authorize?client_id={}&scope=repo",
                client_id
            ),
            None => "https://github.com/login/oauth/authorize?scope=repo".to_string(),
        }
    }
}

fn require_env(name: &str) -> Result<String, GithubError> {
    env::var(name).map_err(|_| GithubError::Config(format!("{} is not set", name)))
}
