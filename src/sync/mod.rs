//! Optimistic synchronization between an open document and the remote store
//!
//! Writes go to the remote first; only a confirmed write patches the shared
//! contents cache, so the cache always reflects a state the server
//! acknowledged.

pub mod document;
pub mod ops;

pub use document::{CommitPrompt, EditorDocument};
pub use ops::SyncOps;
