//! Run-wide settings, built once at startup and passed to every component

use crate::error::{KilnError, KilnResult};
use crate::product::ProductConfig;
use crate::templates::CatalogSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the optional settings file inside the CLI home
pub const SETTINGS_FILE: &str = "config.yaml";

/// Cache subtree for command artifacts
const DEPENDENCIES_DIR: &str = "dependencies";

/// Cache subtree for scaffold templates
const TEMPLATE_DIR: &str = "template";

/// Store directory inside each cache subtree
const STORE_DIR: &str = "node_modules";

/// Values given on the command line; they win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_path: Option<PathBuf>,
    pub registry: Option<String>,
    pub template_catalog: Option<String>,
    pub debug: bool,
}

/// Contents of `<cli home>/config.yaml`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FileSettings {
    #[serde(default)]
    registry: Option<String>,

    #[serde(default)]
    template_catalog: Option<String>,

    #[serde(default)]
    target_path: Option<PathBuf>,
}

/// Resolved settings for one CLI run
#[derive(Debug, Clone)]
pub struct Settings {
    /// The user's home directory
    pub home: PathBuf,
    /// Root of kiln's caches and config
    pub cli_home: PathBuf,
    /// Local artifact used instead of the registry for dispatched commands
    pub target_path: Option<PathBuf>,
    pub registry_url: Url,
    pub catalog: CatalogSource,
    pub debug: bool,
}

impl Settings {
    /// Resolve settings from the real environment
    pub fn load<C: ProductConfig>(config: &C, overrides: Overrides) -> KilnResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| KilnError::configuration("could not determine the user's home directory"))?;
        Self::resolve(config, &home, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve settings with an explicit home and environment lookup.
    ///
    /// Precedence: overrides, then environment, then `config.yaml`, then defaults.
    pub fn resolve<C, E>(config: &C, home: &Path, env: E, overrides: Overrides) -> KilnResult<Self>
    where
        C: ProductConfig,
        E: Fn(&str) -> Option<String>,
    {
        if !home.is_dir() {
            return Err(KilnError::configuration(format!(
                "home directory {} does not exist",
                home.display()
            )));
        }

        let home_dir = env(config.home_env()).unwrap_or_else(|| config.default_home_dir().to_string());
        let cli_home = home.join(home_dir);
        let file = read_file_settings(&cli_home.join(SETTINGS_FILE))?;

        let target_path = overrides
            .target_path
            .or_else(|| env(config.target_path_env()).map(PathBuf::from))
            .or(file.target_path)
            .filter(|p| !p.as_os_str().is_empty());

        let registry = overrides
            .registry
            .or_else(|| env(config.registry_env()))
            .or(file.registry)
            .unwrap_or_else(|| config.default_registry_url().to_string());
        let registry_url = Url::parse(&registry)
            .map_err(|e| KilnError::configuration(format!("invalid registry URL '{}': {}", registry, e)))?;

        let catalog = overrides
            .template_catalog
            .or_else(|| env(config.catalog_env()))
            .or(file.template_catalog)
            .unwrap_or_else(|| config.default_catalog_url().to_string());

        Ok(Self {
            home: home.to_path_buf(),
            cli_home,
            target_path,
            registry_url,
            catalog: CatalogSource::parse(&catalog),
            debug: overrides.debug,
        })
    }

    /// Install root for command artifacts
    pub fn dependencies_dir(&self) -> PathBuf {
        self.cli_home.join(DEPENDENCIES_DIR)
    }

    /// Store holding cached command artifacts
    pub fn dependencies_store(&self) -> PathBuf {
        self.dependencies_dir().join(STORE_DIR)
    }

    /// Install root for template artifacts
    pub fn template_dir(&self) -> PathBuf {
        self.cli_home.join(TEMPLATE_DIR)
    }

    /// Store holding cached template artifacts
    pub fn template_store(&self) -> PathBuf {
        self.template_dir().join(STORE_DIR)
    }
}

fn read_file_settings(path: &Path) -> KilnResult<FileSettings> {
    if !path.is_file() {
        return Ok(FileSettings::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| KilnError::cache_state(path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| KilnError::configuration(format!("failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::tests::TestProduct;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let home = tempfile::tempdir().unwrap();
        let settings =
            Settings::resolve(&TestProduct, home.path(), env_of(&[]), Overrides::default()).unwrap();

        assert_eq!(settings.cli_home, home.path().join(".kiln"));
        assert_eq!(settings.target_path, None);
        assert_eq!(settings.registry_url.as_str(), "https://registry.npmjs.org/");
        assert_eq!(
            settings.dependencies_store(),
            home.path().join(".kiln/dependencies/node_modules")
        );
        assert_eq!(
            settings.template_store(),
            home.path().join(".kiln/template/node_modules")
        );
        assert!(matches!(settings.catalog, CatalogSource::Remote(_)));
    }

    #[test]
    fn test_env_overrides_home_and_target() {
        let home = tempfile::tempdir().unwrap();
        let settings = Settings::resolve(
            &TestProduct,
            home.path(),
            env_of(&[
                ("KILN_HOME", ".kiln-dev"),
                ("KILN_TARGET_PATH", "/work/init"),
                ("KILN_TEMPLATE_CATALOG", "/work/catalog.yaml"),
            ]),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.cli_home, home.path().join(".kiln-dev"));
        assert_eq!(settings.target_path, Some(PathBuf::from("/work/init")));
        assert!(matches!(settings.catalog, CatalogSource::Local(_)));
    }

    #[test]
    fn test_precedence_flag_env_file() {
        let home = tempfile::tempdir().unwrap();
        let cli_home = home.path().join(".kiln");
        std::fs::create_dir_all(&cli_home).unwrap();
        std::fs::write(
            cli_home.join(SETTINGS_FILE),
            "registry: https://file.example.com\ntarget_path: /from/file\n",
        )
        .unwrap();

        let from_file =
            Settings::resolve(&TestProduct, home.path(), env_of(&[]), Overrides::default()).unwrap();
        assert_eq!(from_file.registry_url.as_str(), "https://file.example.com/");
        assert_eq!(from_file.target_path, Some(PathBuf::from("/from/file")));

        let from_env = Settings::resolve(
            &TestProduct,
            home.path(),
            env_of(&[("KILN_REGISTRY", "https://env.example.com")]),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(from_env.registry_url.as_str(), "https://env.example.com/");

        let from_flag = Settings::resolve(
            &TestProduct,
            home.path(),
            env_of(&[("KILN_REGISTRY", "https://env.example.com")]),
            Overrides {
                registry: Some("https://flag.example.com".to_string()),
                target_path: Some(PathBuf::from("/from/flag")),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(from_flag.registry_url.as_str(), "https://flag.example.com/");
        assert_eq!(from_flag.target_path, Some(PathBuf::from("/from/flag")));
    }

    #[test]
    fn test_missing_home_is_configuration_error() {
        let result = Settings::resolve(
            &TestProduct,
            Path::new("/definitely/not/a/home"),
            env_of(&[]),
            Overrides::default(),
        );
        assert!(matches!(result, Err(KilnError::Configuration { .. })));
    }

    #[test]
    fn test_invalid_registry_url() {
        let home = tempfile::tempdir().unwrap();
        let result = Settings::resolve(
            &TestProduct,
            home.path(),
            env_of(&[("KILN_REGISTRY", "not a url")]),
            Overrides::default(),
        );
        assert!(matches!(result, Err(KilnError::Configuration { .. })));
    }
}
