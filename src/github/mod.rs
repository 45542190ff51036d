//! GitHub contents API access

pub mod api;
pub mod client;
pub mod encode;
pub mod errors;
pub mod session;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use api::ContentsApi;
pub use client::{GithubClient, ReauthPrompt};
pub use errors::GithubError;
pub use session::SessionStore;
pub use types::*;
