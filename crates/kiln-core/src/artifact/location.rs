//! Artifact references and the cache-path naming scheme

use std::fmt;
use std::path::{Path, PathBuf};

/// Version sentinel meaning "whatever the registry currently publishes"
pub const LATEST: &str = "latest";

/// A named, versioned artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub name: String,
    pub version: String,
}

impl ArtifactRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// True while the version is still the `latest` sentinel
    pub fn is_latest(&self) -> bool {
        self.version == LATEST
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Escape path separators in an artifact name so it fits in one path segment
pub fn escape_name(name: &str) -> String {
    name.replace('/', "_")
}

/// Compute the on-disk location of `name@version` inside `store`.
///
/// The layout is `store/_<escapedName>@<version>@<name>`, so scoped names
/// like `@scope/pkg` end in a nested `pkg` directory. Callers must pass a
/// resolved version, never [`LATEST`].
pub fn cache_location(store: &Path, name: &str, version: &str) -> PathBuf {
    store.join(format!("_{}@{}@{}", escape_name(name), version, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_location() {
        let path = cache_location(Path::new("/store"), "kiln-template-vue", "1.2.3");
        assert_eq!(
            path,
            PathBuf::from("/store/_kiln-template-vue@1.2.3@kiln-template-vue")
        );
    }

    #[test]
    fn test_scoped_name_location() {
        let path = cache_location(Path::new("/store"), "@kiln-cli/init", "1.0.6");
        assert_eq!(
            path,
            PathBuf::from("/store/_@kiln-cli_init@1.0.6@@kiln-cli/init")
        );
    }

    #[test]
    fn test_location_is_deterministic() {
        let store = Path::new("/tmp/store");
        assert_eq!(
            cache_location(store, "@a/b", "2.0.0"),
            cache_location(store, "@a/b", "2.0.0")
        );
    }

    #[test]
    fn test_distinct_versions_never_collide() {
        let store = Path::new("/tmp/store");
        let versions = ["1.0.0", "1.0.1", "1.1.0", "10.0.0", "1.0.0-beta.1"];
        for a in &versions {
            for b in &versions {
                if a != b {
                    assert_ne!(
                        cache_location(store, "@scope/pkg", a),
                        cache_location(store, "@scope/pkg", b)
                    );
                }
            }
        }
    }

    #[test]
    fn test_display_ref() {
        let r = ArtifactRef::new("@kiln-cli/init", LATEST);
        assert!(r.is_latest());
        assert_eq!(r.to_string(), "@kiln-cli/init@latest");
    }
}
