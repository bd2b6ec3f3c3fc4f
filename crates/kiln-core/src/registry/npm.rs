//! npm-compatible registry client
//!
//! Resolves dist-tags from the package document and installs versions by
//! downloading their tarball and unpacking it into the cache store.

use super::RegistryClient;
use crate::artifact::{cache_location, escape_name, ArtifactRef};
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use url::Url;

/// Public npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Package document as served by `GET /<name>`
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,

    #[serde(default)]
    versions: HashMap<String, VersionDocument>,
}

#[derive(Debug, Deserialize)]
struct VersionDocument {
    dist: Dist,
}

#[derive(Debug, Deserialize)]
struct Dist {
    tarball: String,
}

/// Registry client for npm and npm-compatible mirrors
pub struct NpmRegistry {
    base: Url,
    client: reqwest::Client,
}

impl NpmRegistry {
    /// Create a client for the registry at `base` with a custom user agent
    pub fn new(base: Url, user_agent: &str) -> Self {
        Self {
            base,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Registry base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build the package document URL; scoped names keep their `/` encoded
    fn package_url(&self, name: &str) -> KilnResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| KilnError::registry(format!("URL cannot have path segments: {}", self.base)))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    async fn fetch_packument(&self, name: &str) -> KilnResult<Packument> {
        let url = self.package_url(name)?;
        tracing::debug!(%url, "fetching package document");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| KilnError::registry(format!("failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(KilnError::registry(format!(
                "failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KilnError::registry(format!("invalid package document for {}: {}", name, e)))
    }

    async fn download(&self, url: &str) -> KilnResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KilnError::registry(format!("failed to download {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(KilnError::registry(format!(
                "failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }

        Ok(response
            .bytes()
            .await
            .map_err(|e| KilnError::registry(format!("failed to read {}: {}", url, e)))?
            .to_vec())
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn latest_version(&self, name: &str) -> KilnResult<String> {
        let packument = self.fetch_packument(name).await?;
        packument
            .dist_tags
            .get("latest")
            .cloned()
            .ok_or_else(|| KilnError::registry(format!("{} has no latest dist-tag", name)))
    }

    async fn materialize(
        &self,
        artifact: &ArtifactRef,
        target_path: &Path,
        store_dir: &Path,
    ) -> KilnResult<()> {
        let install_error = |message: String| KilnError::Install {
            artifact: artifact.to_string(),
            message,
        };

        let location = cache_location(store_dir, &artifact.name, &artifact.version);
        if location.exists() {
            return Ok(());
        }

        let packument = self.fetch_packument(&artifact.name).await?;
        let version = packument
            .versions
            .get(&artifact.version)
            .ok_or_else(|| install_error(format!("version {} is not published", artifact.version)))?;

        tracing::debug!(
            tarball = %version.dist.tarball,
            target = %target_path.display(),
            store = %store_dir.display(),
            "installing artifact"
        );
        let bytes = self.download(&version.dist.tarball).await?;

        // Unpack beside the final location, then move it into place in one rename
        let staging = store_dir.join(format!(
            ".staging_{}@{}",
            escape_name(&artifact.name),
            artifact.version
        ));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .await
                .map_err(|e| KilnError::cache_state(&staging, e))?;
        }
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| KilnError::cache_state(&staging, e))?;

        if let Err(e) = unpack_tarball(&bytes, &staging) {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(install_error(format!("malformed package tarball: {}", e)));
        }

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KilnError::cache_state(parent, e))?;
        }
        fs::rename(&staging, &location)
            .await
            .map_err(|e| KilnError::cache_state(&location, e))?;

        Ok(())
    }
}

/// Unpack an npm tarball into `dest`, dropping the leading `package/` directory
pub(crate) fn unpack_tarball(bytes: &[u8], dest: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(Cursor::new(bytes)));

    for entry in archive.entries()? {
        let mut entry = entry?;
        // Links could point a later entry outside the store
        let kind = entry.header().entry_type();
        if !(kind.is_file() || kind.is_dir()) {
            tracing::debug!(?kind, "skipping tarball entry");
            continue;
        }
        let path = entry.path()?.into_owned();
        let relative: PathBuf = path.components().skip(1).collect();

        if relative.as_os_str().is_empty() {
            continue;
        }
        // Only plain relative segments may land inside the store
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            continue;
        }

        let out = dest.join(&relative);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_package_url_encodes_scope() {
        let registry = NpmRegistry::new(Url::parse(DEFAULT_REGISTRY_URL).unwrap(), "kiln-test");
        let url = registry.package_url("@kiln-cli/init").unwrap();
        assert_eq!(url.as_str(), "https://registry.npmjs.org/@kiln-cli%2Finit");
    }

    #[test]
    fn test_package_url_keeps_base_path() {
        let registry = NpmRegistry::new(
            Url::parse("https://mirror.example.com/npm/").unwrap(),
            "kiln-test",
        );
        let url = registry.package_url("left-pad").unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.com/npm/left-pad");
    }

    #[test]
    fn test_unpack_strips_package_prefix() {
        let bytes = tarball(&[
            ("package/package.json", r#"{"name":"demo","main":"index.js"}"#),
            ("package/template/README.md", "# {{ projectName }}"),
        ]);
        let tmp = tempfile::tempdir().unwrap();

        unpack_tarball(&bytes, tmp.path()).unwrap();

        assert!(tmp.path().join("package.json").is_file());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("template/README.md")).unwrap(),
            "# {{ projectName }}"
        );
    }

    #[test]
    fn test_unpack_skips_links() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::create_dir_all(&dest).unwrap();

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        builder.append_link(&mut link, "package/link", &outside).unwrap();
        let content = b"escaped";
        let mut file = tar::Header::new_gnu();
        file.set_size(content.len() as u64);
        file.set_mode(0o644);
        file.set_cksum();
        builder
            .append_data(&mut file, "package/link/evil.txt", &content[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        unpack_tarball(&bytes, &dest).unwrap();

        assert!(!outside.join("evil.txt").exists());
        assert!(!dest.join("link").is_symlink());
        assert_eq!(std::fs::read(dest.join("link/evil.txt")).unwrap(), b"escaped");
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(unpack_tarball(b"definitely not gzip", tmp.path()).is_err());
    }

    #[test]
    fn test_packument_parsing() {
        let doc: Packument = serde_json::from_str(
            r#"{
                "name": "demo",
                "dist-tags": { "latest": "1.1.0" },
                "versions": {
                    "1.1.0": { "dist": { "tarball": "https://r.example/demo-1.1.0.tgz" } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(doc.dist_tags["latest"], "1.1.0");
        assert_eq!(
            doc.versions["1.1.0"].dist.tarball,
            "https://r.example/demo-1.1.0.tgz"
        );
    }
}
