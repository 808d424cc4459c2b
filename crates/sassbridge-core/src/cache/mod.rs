//! In-memory compilation cache for stylesheet builds
//!
//! Entries are keyed on the entry file's path and validated by a
//! modification-time fingerprint covering the file, its reported
//! dependencies, and the statically configured extra roots. Nothing is
//! persisted between runs.

mod freshness;
mod store;

pub use freshness::{fingerprint, mtime_millis};
pub use store::{CacheEntry, CompileCache, CompiledResult};
