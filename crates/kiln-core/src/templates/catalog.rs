//! Template catalog fetching from a remote URL or a local file
//!
//! The catalog is a YAML (or JSON) list of template records:
//!
//! ```yaml
//! - name: Vue 3 starter
//!   npmName: kiln-template-vue3
//!   version: 1.0.0
//!   type: normal
//!   installCommand: npm install
//!   startCommand: npm run serve
//! ```
//!
//! A `{ templates: [...] }` wrapper is accepted as well.

use crate::artifact::ArtifactRef;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::fs;
use url::Url;

/// How a template gets installed into the project directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateKind {
    /// Copy the `template/` folder and render it
    #[default]
    Normal,
    /// Hand over to the template's own entry point
    Custom,
    /// Anything else; rejected at install time
    Unknown(String),
}

impl From<String> for TemplateKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "normal" => Self::Normal,
            "custom" => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

impl From<TemplateKind> for String {
    fn from(kind: TemplateKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Custom => write!(f, "custom"),
            Self::Unknown(kind) => write!(f, "{}", kind),
        }
    }
}

/// One catalog record as published
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRecord {
    name: String,
    npm_name: String,
    version: String,
    #[serde(default, rename = "type")]
    kind: TemplateKind,
    #[serde(default)]
    install_command: Option<String>,
    #[serde(default)]
    start_command: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<CatalogRecord>),
    Wrapped { templates: Vec<CatalogRecord> },
}

/// A template offered by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub artifact: ArtifactRef,
    pub display_name: String,
    pub kind: TemplateKind,
    pub install_command: Option<String>,
    pub start_command: Option<String>,
}

impl From<CatalogRecord> for TemplateDescriptor {
    fn from(record: CatalogRecord) -> Self {
        Self {
            artifact: ArtifactRef::new(record.npm_name, record.version),
            display_name: record.name,
            kind: record.kind,
            install_command: record.install_command,
            start_command: record.start_command,
        }
    }
}

/// Parse a catalog document
pub fn parse_catalog(content: &str) -> Result<Vec<TemplateDescriptor>> {
    let document: CatalogDocument =
        serde_yaml::from_str(content).context("Failed to parse template catalog")?;
    let records = match document {
        CatalogDocument::List(records) => records,
        CatalogDocument::Wrapped { templates } => templates,
    };
    Ok(records.into_iter().map(TemplateDescriptor::from).collect())
}

/// Source of available templates
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<TemplateDescriptor>>;
}

/// Catalog location - either remote URL or local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote(Url),
    Local(PathBuf),
}

impl CatalogSource {
    /// `http(s)` URLs are remote, anything else is a local path
    pub fn parse(value: &str) -> Self {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Local(PathBuf::from(value)),
        }
    }
}

/// Catalog fetcher - handles retrieving the template list from remote or local sources
pub struct CatalogFetcher {
    source: CatalogSource,
    client: reqwest::Client,
}

impl CatalogFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(source: CatalogSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Get the catalog source
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }
}

#[async_trait]
impl TemplateCatalog for CatalogFetcher {
    async fn list(&self) -> Result<Vec<TemplateDescriptor>> {
        let content = match &self.source {
            CatalogSource::Remote(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch template catalog from {}", url))?;

                if !response.status().is_success() {
                    anyhow::bail!(
                        "Failed to fetch template catalog from {}: HTTP {}",
                        url,
                        response.status()
                    );
                }

                response.text().await?
            }
            CatalogSource::Local(path) => fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        };

        parse_catalog(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_list() {
        let templates = parse_catalog(
            r#"
- name: Vue 3 starter
  npmName: kiln-template-vue3
  version: 1.0.0
  installCommand: npm install
  startCommand: npm run serve
- name: Admin shell
  npmName: "@acme/kiln-admin"
  version: 2.1.0
  type: custom
"#,
        )
        .unwrap();

        assert_eq!(templates.len(), 2);
        assert_eq!(
            templates[0].artifact,
            ArtifactRef::new("kiln-template-vue3", "1.0.0")
        );
        assert_eq!(templates[0].kind, TemplateKind::Normal);
        assert_eq!(templates[0].install_command.as_deref(), Some("npm install"));
        assert_eq!(templates[1].kind, TemplateKind::Custom);
        assert_eq!(templates[1].start_command, None);
    }

    #[test]
    fn test_parse_wrapped_json() {
        let templates = parse_catalog(
            r#"{ "templates": [ { "name": "Odd", "npmName": "odd", "version": "1.0.0", "type": "mystery" } ] }"#,
        )
        .unwrap();
        assert_eq!(templates[0].kind, TemplateKind::Unknown("mystery".to_string()));
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_catalog("[]").unwrap().is_empty());
    }

    #[test]
    fn test_catalog_source_parse() {
        assert!(matches!(
            CatalogSource::parse("https://templates.kiln.dev/catalog.yaml"),
            CatalogSource::Remote(_)
        ));
        assert_eq!(
            CatalogSource::parse("./templates/catalog.yaml"),
            CatalogSource::Local(PathBuf::from("./templates/catalog.yaml"))
        );
        assert!(matches!(
            CatalogSource::parse("C:\\templates\\catalog.yaml"),
            CatalogSource::Local(_)
        ));
    }

    #[tokio::test]
    async fn test_local_fetcher_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.yaml");
        std::fs::write(&path, "- name: A\n  npmName: a\n  version: 0.1.0\n").unwrap();

        let fetcher = CatalogFetcher::new(CatalogSource::Local(path), "kiln-test");
        let templates = fetcher.list().await.unwrap();
        assert_eq!(templates[0].display_name, "A");
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let templates = parse_catalog(include_str!("../../../../templates/catalog.yaml")).unwrap();
        assert_eq!(templates.len(), 3);
        assert!(templates[1].artifact.is_latest());
        assert_eq!(templates[1].kind, TemplateKind::Normal);
        assert_eq!(templates[2].kind, TemplateKind::Custom);
    }
}
