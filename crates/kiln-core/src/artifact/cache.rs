//! On-disk cache of installed artifacts
//!
//! A cache instance tracks one artifact. In store-backed mode its files live at
//! [`cache_location`] inside the store; each version gets its own directory and
//! older versions are kept. Without a store the cache runs in direct-path mode
//! and simply points at `target_path`, which is how local checkouts are used
//! during development.

use super::entry::{self, EntryPoint};
use super::location::{cache_location, ArtifactRef};
use crate::error::{KilnError, KilnResult};
use crate::registry::RegistryClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Construction options for [`ArtifactCache`]
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Install root, or the artifact itself in direct-path mode
    pub target_path: PathBuf,
    /// Store holding versioned cache entries; `None` selects direct-path mode
    pub store_dir: Option<PathBuf>,
    pub name: String,
    /// Concrete version or `latest`
    pub version: String,
}

/// Cache handle for a single artifact
pub struct ArtifactCache {
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    artifact: ArtifactRef,
    registry: Arc<dyn RegistryClient>,
}

impl ArtifactCache {
    /// Validate `options` and build the cache.
    ///
    /// Fails with [`KilnError::Configuration`] on an empty name or target path,
    /// or a version that is neither `latest` nor valid semver.
    pub fn new(options: CacheOptions, registry: Arc<dyn RegistryClient>) -> KilnResult<Self> {
        if options.name.trim().is_empty() {
            return Err(KilnError::configuration("artifact name must not be empty"));
        }
        if options.target_path.as_os_str().is_empty() {
            return Err(KilnError::configuration(format!(
                "target path for {} must not be empty",
                options.name
            )));
        }
        let artifact = ArtifactRef::new(options.name, options.version);
        if !artifact.is_latest() && semver::Version::parse(&artifact.version).is_err() {
            return Err(KilnError::configuration(format!(
                "'{}' is not a valid version for {}",
                artifact.version, artifact.name
            )));
        }

        Ok(Self {
            target_path: options.target_path,
            store_dir: options.store_dir,
            artifact,
            registry,
        })
    }

    /// The artifact this cache tracks; `latest` until [`prepare`](Self::prepare) runs
    pub fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    /// Location of the tracked version, if the cache is store-backed and resolved
    pub fn cache_location(&self) -> Option<PathBuf> {
        let store = self.store_dir.as_deref()?;
        if self.artifact.is_latest() {
            return None;
        }
        Some(cache_location(store, &self.artifact.name, &self.artifact.version))
    }

    /// Directory the artifact's files are read from
    pub fn artifact_dir(&self) -> Option<PathBuf> {
        match &self.store_dir {
            Some(_) => self.cache_location(),
            None => Some(self.target_path.clone()),
        }
    }

    /// Create the store directory and resolve `latest`. Safe to call repeatedly.
    pub async fn prepare(&mut self) -> KilnResult<()> {
        if let Some(store) = &self.store_dir {
            if !store.exists() {
                fs::create_dir_all(store)
                    .await
                    .map_err(|e| KilnError::cache_state(store, e))?;
            }
        }
        if self.artifact.is_latest() {
            let version = self.resolve_latest().await?;
            tracing::debug!(artifact = %self.artifact.name, %version, "resolved latest");
            self.artifact.version = version;
        }
        Ok(())
    }

    /// Whether the tracked version is present on disk
    pub async fn exists(&mut self) -> KilnResult<bool> {
        if self.store_dir.is_none() {
            return Ok(self.target_path.exists());
        }
        self.prepare().await?;
        Ok(self
            .cache_location()
            .is_some_and(|location| location.exists()))
    }

    /// Install the tracked version into the store
    pub async fn install(&mut self) -> KilnResult<()> {
        let store = self.require_store()?;
        self.prepare().await?;
        tracing::debug!(artifact = %self.artifact, "installing");
        self.registry
            .materialize(&self.artifact, &self.target_path, &store)
            .await
    }

    /// Install the registry's latest version unless it is already cached.
    ///
    /// An already-cached latest version is never downloaded again, even when
    /// this instance currently tracks an older version; the tracked version
    /// only moves when an install actually happens.
    pub async fn update(&mut self) -> KilnResult<()> {
        let store = self.require_store()?;
        self.prepare().await?;
        let latest = self.resolve_latest().await?;
        let latest_location = cache_location(&store, &self.artifact.name, &latest);

        if latest_location.exists() {
            tracing::debug!(artifact = %self.artifact.name, %latest, "latest already cached");
            return Ok(());
        }

        let latest_ref = ArtifactRef::new(self.artifact.name.clone(), latest);
        tracing::debug!(artifact = %latest_ref, "updating");
        self.registry
            .materialize(&latest_ref, &self.target_path, &store)
            .await?;
        self.artifact = latest_ref;
        Ok(())
    }

    /// Entry point declared by the enclosing package descriptor, if any
    pub fn locate_entry_point(&self) -> KilnResult<Option<EntryPoint>> {
        match self.artifact_dir() {
            Some(dir) => entry::locate_entry_point(&dir),
            None => Ok(None),
        }
    }

    /// Ask the registry for `latest`; the answer becomes a path segment, so it must be semver
    async fn resolve_latest(&self) -> KilnResult<String> {
        let version = self.registry.latest_version(&self.artifact.name).await?;
        if semver::Version::parse(&version).is_err() {
            return Err(KilnError::registry(format!(
                "registry returned '{}' as the latest version of {}",
                version, self.artifact.name
            )));
        }
        Ok(version)
    }

    fn require_store(&self) -> KilnResult<PathBuf> {
        self.store_dir.clone().ok_or_else(|| {
            KilnError::configuration(format!(
                "{} has no store directory; direct-path artifacts cannot be installed",
                self.artifact.name
            ))
        })
    }
}
