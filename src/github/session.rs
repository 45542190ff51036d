//! Persisted login session
//!
//! The bearer token lives on disk under a fixed key and expires 7 days after
//! storage. Requests read the token per call, so a re-login takes effect
//! without restarting.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fixed storage key for the session token
const TOKEN_KEY: &str = "github-token";

/// Sessions expire 7 days after storage
const TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// On-disk session record
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
    /// Unix seconds after which the token is no longer valid
    expires_at: u64,
}

/// Disk-backed store for the bearer token
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store at the platform config location
    pub fn new() -> Self {
        let base = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("gitdoc");
        Self::at(base)
    }

    /// Create a store rooted at a specific directory
    pub fn at(dir: PathBuf) -> Self {
        Self {
            path: dir.join(format!("{}.json", TOKEN_KEY)),
        }
    }

    /// Store a token, valid for the next 7 days
    pub fn store(&self, token: &str) -> Result<()> {
        let record = SessionRecord {
            token: token.to_string(),
            expires_at: unix_now() + TOKEN_TTL.as_secs(),
        };

        let parent = self.path.parent().context("Session path has no parent")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create session directory: {:?}", parent))?;

        // Write atomically using tempfile
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temp file for session")?;
        serde_json::to_writer(&mut tmp, &record).context("Failed to write session record")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to persist session file: {:?}", self.path))?;

        info!(path = %self.path.display(), "Stored login session");
        Ok(())
    }

    /// Load the stored token, or None when absent, unreadable, or expired
    pub fn load(&self) -> Option<String> {
        let data = fs::read_to_string(&self.path).ok()?;
        let record: SessionRecord = serde_json::from_str(&data).ok()?;
        if record.expires_at <= unix_now() {
            debug!(path = %self.path.display(), "Stored session has expired");
            return None;
        }
        Some(record.token)
    }

    /// Remove the stored session, if any
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file: {:?}", self.path))?;
            info!(path = %self.path.display(), "Cleared login session");
        }
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
