//! Versioned artifact cache
//!
//! This module provides:
//! - Artifact references and the deterministic cache-path scheme
//! - The per-artifact cache handle (prepare, exists, install, update)
//! - Package descriptor parsing and entry-point lookup

pub mod cache;
pub mod entry;
pub mod location;

pub use cache::{ArtifactCache, CacheOptions};
pub use entry::{locate_entry_point, EntryPoint, PackageDescriptor};
pub use location::{cache_location, escape_name, ArtifactRef, LATEST};

/// Bring `cache` up to date: update when something is cached, install otherwise
pub async fn ensure_present(cache: &mut ArtifactCache) -> crate::error::KilnResult<()> {
    if cache.exists().await? {
        cache.update().await
    } else {
        cache.install().await
    }
}
