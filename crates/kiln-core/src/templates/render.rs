//! In-place template variable substitution over a project tree
//!
//! Only `<%= expr %>` tags are substituted; each expression is evaluated with
//! Tera, so filters such as `<%= projectName | upper %>` work. Anything else,
//! including `{{ }}` mustaches used by front-end frameworks, passes through
//! untouched. All files render concurrently; the first failure fails the
//! whole pass.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use regex::{Captures, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tera::Tera;
use tokio::fs;
use walkdir::WalkDir;

/// Top-level folders never rendered: installed dependencies and static assets
pub const RENDER_IGNORE: &[&str] = &["node_modules", "public"];

static OUTPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%=\s*(.*?)\s*%>").expect("valid output tag regex"));

/// List every file under `root`, skipping top-level folders named in `ignore`
pub fn collect_render_targets(root: &Path, ignore: &[&str]) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|entry| {
        !(entry.depth() == 1
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| ignore.contains(&name)))
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Render every file under `root` with `vars`, returning how many changed
pub async fn render_tree<T: Serialize>(root: &Path, vars: &T, ignore: &[&str]) -> Result<usize> {
    let context = tera::Context::from_serialize(vars).context("Failed to build render variables")?;
    let files = collect_render_targets(root, ignore)?;
    tracing::debug!(count = files.len(), root = %root.display(), "rendering templates");

    let changed = try_join_all(files.into_iter().map(|path| render_file(path, &context))).await?;
    Ok(changed.into_iter().filter(|c| *c).count())
}

/// Render one file in place; non-UTF-8 files are left untouched
async fn render_file(path: PathBuf, context: &tera::Context) -> Result<bool> {
    let bytes = fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(source) = String::from_utf8(bytes) else {
        return Ok(false);
    };

    if !OUTPUT_TAG.is_match(&source) {
        return Ok(false);
    }
    let rendered = render_str(&source, context)
        .with_context(|| format!("Failed to render {}", path.display()))?;

    fs::write(&path, rendered)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Substitute every output tag in `source`
pub fn render_str(source: &str, context: &tera::Context) -> Result<String> {
    let mut failure = None;
    let rendered = OUTPUT_TAG.replace_all(source, |caps: &Captures| {
        let expr = &caps[1];
        match Tera::one_off(&format!("{{{{ {expr} }}}}"), context, false) {
            Ok(value) => value,
            Err(err) => {
                if failure.is_none() {
                    failure = Some(
                        anyhow::Error::new(err).context(format!("Failed to evaluate `{expr}`")),
                    );
                }
                String::new()
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(rendered.into_owned()),
    }
}
