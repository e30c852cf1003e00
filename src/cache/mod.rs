//! Time-boxed result cache shared by every read.
//!
//! - Keys are signatures of action + parameters
//! - Entries expire lazily after the TTL (5 minutes by default)
//! - Any successful write clears the whole cache

mod layer;
mod storage;
mod traits;

pub use layer::{ResultCache, DEFAULT_TTL};
pub use storage::{CacheEntry, CacheStorage, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, RequestKey, Signature};
