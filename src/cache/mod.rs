//! Build cache lifecycle
//!
//! Entries are immutable and addressed by `{key}-{timestamp}`. The newest
//! entry of a key family is restored through the `{key}-` restore prefix;
//! before saving, older entries of the family are deleted so they can
//! never be restored again.
//!
//! # Operations
//!
//! | Operation | Phase | On failure |
//! |-----------|-------|------------|
//! | restore | main (unless clearing) | warning, build runs cold |
//! | prune | pre (when clearing), post | fatal |
//! | save | post (on success) | fatal |

pub mod archive;
pub mod backend;
pub mod keys;
pub mod manager;
pub mod service;

pub use backend::{CacheEntry, CacheRegistry, CacheStorage};
pub use manager::{CacheManager, SavedCache};
pub use service::ActionsCacheService;
