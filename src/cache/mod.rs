//! Contents caching layer
//!
//! Path-keyed cache of remote state with read-through population and
//! optimistic post-write patching.

pub mod contents;

pub use contents::{Address, ContentsCache};
