//! Project information collected once per scaffold run

use super::version::normalize_version;
use crate::error::{KilnError, KilnResult};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Letters first, then letters/digits, with `-` or `_` only between word groups
static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]+([-][a-zA-Z][a-zA-Z0-9]*|[_][a-zA-Z][a-zA-Z0-9]*|[a-zA-Z0-9])*$")
        .expect("project name pattern is valid")
});

/// What is being scaffolded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaffoldKind {
    Project,
    /// Reserved; no fields are collected for components yet
    Component,
}

impl fmt::Display for ScaffoldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldKind::Project => write!(f, "project"),
            ScaffoldKind::Component => write!(f, "component"),
        }
    }
}

/// Check a project name against the naming rules
pub fn validate_project_name(name: &str) -> KilnResult<()> {
    if PROJECT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(KilnError::Validation {
            field: "project name",
            message: format!(
                "'{}' must start with a letter and use '-' or '_' only between words",
                name
            ),
        })
    }
}

/// Kebab-case a name: every uppercase letter becomes `-` plus its lowercase form.
/// A leading `-` produced by an initial capital is dropped.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            out.push('-');
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    match out.strip_prefix('-') {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

/// Validated project answers, exposed to templates as render variables
///
/// Serialized field names are the variable names templates use:
/// `type`, `projectName`, `version`, `projectTemplate` and `className`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    #[serde(rename = "type")]
    kind: ScaffoldKind,
    #[serde(rename = "projectName")]
    name: String,
    version: String,
    #[serde(rename = "projectTemplate")]
    template: String,
    #[serde(rename = "className")]
    slug: String,
}

impl ProjectInfo {
    /// Validate the name, normalize the version and derive the slug
    pub fn new(name: &str, version: &str, template: &str) -> KilnResult<Self> {
        validate_project_name(name)?;
        let version = normalize_version(version)?;
        Ok(Self {
            kind: ScaffoldKind::Project,
            name: name.to_string(),
            version,
            template: template.to_string(),
            slug: slugify(name),
        })
    }

    pub fn kind(&self) -> ScaffoldKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Artifact name of the selected template
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}
