//! Package registry access
//!
//! The cache never talks HTTP itself; it goes through [`RegistryClient`] so
//! tests and alternative registries can stand in for npm.

pub mod npm;

use crate::artifact::ArtifactRef;
use crate::error::KilnResult;
use async_trait::async_trait;
use std::path::Path;

pub use npm::NpmRegistry;

/// Capability for resolving and materializing published artifacts
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Latest published version of `name`
    async fn latest_version(&self, name: &str) -> KilnResult<String>;

    /// Install `artifact` (resolved version) into `store_dir`.
    ///
    /// On success the artifact's files live at
    /// [`cache_location`](crate::artifact::cache_location)`(store_dir, name, version)`.
    /// Implementations must not leave a partial entry at that location.
    async fn materialize(
        &self,
        artifact: &ArtifactRef,
        target_path: &Path,
        store_dir: &Path,
    ) -> KilnResult<()>;
}
