//! Scaffold pipeline behind `kiln init`
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! Idle → TemplateCatalogLoaded → DirectoryChecked → InfoCollected →
//! TemplateFetched → Installed → Rendered → DependenciesInstalled →
//! Started → Done
//! ```
//!
//! Custom templates render nothing themselves and go straight from
//! `Installed` to `DependenciesInstalled`.
//!
//! The run can stop early without error when the user declines to touch a
//! non-empty directory or picks the component kind. Any error aborts the run
//! and leaves the directory as the last finished stage left it.

use super::prompt::{project_name_answer, version_answer, Prompter, SelectItem};
use crate::artifact::{ensure_present, ArtifactCache, CacheOptions};
use crate::command::{CommandOptions, Invocation};
use crate::config::Settings;
use crate::dispatch::PluginLoader;
use crate::error::KilnError;
use crate::registry::RegistryClient;
use crate::runtime::spawn::{ProcessSpawner, SpawnOptions};
use crate::templates::catalog::{TemplateCatalog, TemplateDescriptor, TemplateKind};
use crate::templates::copier::copy_template;
use crate::templates::project::{validate_project_name, ProjectInfo, ScaffoldKind};
use crate::templates::render::{render_tree, RENDER_IGNORE};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Programs templates may run after scaffolding
pub const ALLOWED_PROGRAMS: &[&str] = &["npm", "cnpm"];

/// Folder inside a template artifact that gets copied into the project
pub const TEMPLATE_FOLDER: &str = "template";

/// Entries ignored when deciding whether the target directory is empty
const DIR_IGNORE: &[&str] = &["node_modules"];

const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    TemplateCatalogLoaded,
    DirectoryChecked,
    InfoCollected,
    TemplateFetched,
    Installed,
    Rendered,
    DependenciesInstalled,
    Started,
    Done,
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    Done(ProjectInfo),
    /// The user declined to continue in a non-empty directory
    Cancelled,
    /// Component scaffolding collects nothing yet
    ComponentReserved,
}

/// Inputs of one scaffold run
#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    /// Name given on the command line; prompted for when missing or invalid
    pub project_name: Option<String>,
    /// Skip the "continue in a non-empty directory" question
    pub force: bool,
    /// Directory the project is created in
    pub cwd: PathBuf,
}

/// Collaborators the pipeline talks to
#[derive(Clone)]
pub struct ScaffoldServices {
    pub catalog: Arc<dyn TemplateCatalog>,
    pub registry: Arc<dyn RegistryClient>,
    pub prompter: Arc<dyn Prompter>,
    pub spawner: Arc<dyn ProcessSpawner>,
    /// Loads custom templates' installers
    pub loader: Arc<dyn PluginLoader>,
}

pub struct ScaffoldPipeline {
    template_target: PathBuf,
    template_store: PathBuf,
    services: ScaffoldServices,
    stage: Stage,
}

impl ScaffoldPipeline {
    pub fn new(settings: &Settings, services: ScaffoldServices) -> Self {
        Self {
            template_target: settings.template_dir(),
            template_store: settings.template_store(),
            services,
            stage: Stage::Idle,
        }
    }

    /// Last stage the current or previous run completed
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub async fn run(&mut self, request: &ScaffoldRequest) -> Result<ScaffoldOutcome> {
        self.stage = Stage::Idle;

        let templates = self.load_catalog().await?;
        self.advance(Stage::TemplateCatalogLoaded);

        if !self.check_directory(&request.cwd, request.force).await? {
            return Ok(ScaffoldOutcome::Cancelled);
        }
        self.advance(Stage::DirectoryChecked);

        let info = self.collect_info(request.project_name.as_deref(), &templates)?;
        self.advance(Stage::InfoCollected);
        let Some(info) = info else {
            return Ok(ScaffoldOutcome::ComponentReserved);
        };
        tracing::debug!(?info, "project info");

        let template = templates
            .iter()
            .find(|t| t.artifact.name == info.template())
            .ok_or_else(|| {
                KilnError::configuration(format!("template {} is not in the catalog", info.template()))
            })?;
        let cache = self.fetch_template(template).await?;
        self.advance(Stage::TemplateFetched);

        match &template.kind {
            TemplateKind::Normal => {
                self.install_normal(&cache, &request.cwd).await?;
                self.advance(Stage::Installed);
                let rendered = render_tree(&request.cwd, &info, RENDER_IGNORE).await?;
                tracing::debug!(rendered, "rendered project files");
                self.advance(Stage::Rendered);
            }
            TemplateKind::Custom => {
                self.install_custom(&cache, template, &info, &request.cwd).await?;
                self.advance(Stage::Installed);
            }
            TemplateKind::Unknown(kind) => {
                return Err(KilnError::UnknownKind { kind: kind.clone() }.into());
            }
        }

        if let Some(command) = &template.install_command {
            let code = self.run_allowed(command, &request.cwd).await?;
            if code != 0 {
                return Err(KilnError::DependencyInstall {
                    command: command.clone(),
                    code,
                }
                .into());
            }
        }
        self.advance(Stage::DependenciesInstalled);

        if let Some(command) = &template.start_command {
            let code = self.run_allowed(command, &request.cwd).await?;
            tracing::debug!(code, "start command finished");
        }
        self.advance(Stage::Started);

        self.advance(Stage::Done);
        Ok(ScaffoldOutcome::Done(info))
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "scaffold stage");
        self.stage = stage;
    }

    async fn load_catalog(&self) -> Result<Vec<TemplateDescriptor>> {
        let templates = self.services.catalog.list().await?;
        if templates.is_empty() {
            return Err(KilnError::configuration("no project templates are available").into());
        }
        tracing::debug!(count = templates.len(), "templates loaded");
        Ok(templates)
    }

    /// Returns `false` when the user chose not to continue
    async fn check_directory(&self, cwd: &Path, force: bool) -> Result<bool> {
        let visible = visible_entries(cwd).await?;
        if visible.is_empty() {
            return Ok(true);
        }
        tracing::debug!(entries = visible.len(), dir = %cwd.display(), "directory not empty");

        let prompter = &self.services.prompter;
        if !force
            && !prompter.confirm(
                "The current directory is not empty. Create the project here anyway?",
                false,
            )?
        {
            return Ok(false);
        }
        if !prompter.confirm("Delete everything in the current directory?", false)? {
            return Ok(false);
        }

        clear_dir(cwd).await?;
        prompter.info("Cleared the current directory")?;
        Ok(true)
    }

    /// `None` means the component kind was picked
    fn collect_info(
        &self,
        project_name: Option<&str>,
        templates: &[TemplateDescriptor],
    ) -> Result<Option<ProjectInfo>> {
        let prompter = &self.services.prompter;
        let kinds = [
            (ScaffoldKind::Project, SelectItem::new("Project", "")),
            (ScaffoldKind::Component, SelectItem::new("Component", "")),
        ];
        let items: Vec<SelectItem> = kinds.iter().map(|(_, item)| item.clone()).collect();
        let kind = kinds[prompter.select("What do you want to create?", &items, 0)?].0;
        if kind == ScaffoldKind::Component {
            return Ok(None);
        }

        let name = match project_name.filter(|name| validate_project_name(name).is_ok()) {
            Some(name) => name.to_string(),
            None => prompter.input("Project name", None, project_name_answer)?,
        };
        let version = prompter.input("Project version", Some(DEFAULT_VERSION), version_answer)?;

        let items: Vec<SelectItem> = templates
            .iter()
            .map(|t| SelectItem::new(t.display_name.clone(), t.artifact.name.clone()))
            .collect();
        let selected = prompter.select("Project template", &items, 0)?;
        let template = &templates[selected].artifact.name;

        Ok(Some(ProjectInfo::new(&name, &version, template)?))
    }

    async fn fetch_template(&self, template: &TemplateDescriptor) -> Result<ArtifactCache> {
        let mut cache = ArtifactCache::new(
            CacheOptions {
                target_path: self.template_target.clone(),
                store_dir: Some(self.template_store.clone()),
                name: template.artifact.name.clone(),
                version: template.artifact.version.clone(),
            },
            self.services.registry.clone(),
        )?;

        let action = if cache.exists().await? { "Updated" } else { "Downloaded" };
        let progress = self
            .services
            .prompter
            .progress(&format!("Fetching template {}", template.artifact));
        if let Err(err) = ensure_present(&mut cache).await {
            progress.fail("Template download failed");
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to fetch template {}", template.artifact)));
        }
        progress.finish(&format!("{} template {}", action, cache.artifact()));
        Ok(cache)
    }

    async fn install_normal(&self, cache: &ArtifactCache, cwd: &Path) -> Result<()> {
        let source = artifact_dir(cache)?.join(TEMPLATE_FOLDER);
        tracing::debug!(source = %source.display(), target = %cwd.display(), "copying template");
        let progress = self.services.prompter.progress("Installing template");
        match copy_template(&source, cwd).await {
            Ok(copied) => {
                progress.finish(&format!("Installed template ({} files)", copied.len()));
                Ok(())
            }
            Err(err) => {
                progress.fail("Template install failed");
                Err(err)
            }
        }
    }

    async fn install_custom(
        &self,
        cache: &ArtifactCache,
        template: &TemplateDescriptor,
        info: &ProjectInfo,
        cwd: &Path,
    ) -> Result<()> {
        let entry = cache.locate_entry_point()?.ok_or_else(|| KilnError::Install {
            artifact: cache.artifact().to_string(),
            message: "custom template declares no entry point".to_string(),
        })?;

        let mut options = CommandOptions {
            target_path: Some(cwd.to_path_buf()),
            ..CommandOptions::default()
        };
        options
            .extra
            .insert("projectInfo".to_string(), serde_json::to_value(info)?);
        options.extra.insert(
            "templateInfo".to_string(),
            json!({
                "name": template.display_name,
                "npmName": template.artifact.name,
                "version": cache.artifact().version,
                "type": template.kind.to_string(),
                "installCommand": template.install_command,
                "startCommand": template.start_command,
            }),
        );
        options.extra.insert(
            "sourcePath".to_string(),
            serde_json::to_value(entry.package_dir.join(TEMPLATE_FOLDER))?,
        );

        let installer = self.services.loader.load(&entry)?;
        installer
            .invoke(&Invocation::new("install", Vec::new(), options))
            .await
            .with_context(|| format!("Custom install of {} failed", cache.artifact()))?;
        self.services.prompter.success("Installed custom template")?;
        Ok(())
    }

    /// Run an allow-listed command; anything else counts as a successful no-op
    async fn run_allowed(&self, command: &str, cwd: &Path) -> Result<i32> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Ok(0);
        };
        if !ALLOWED_PROGRAMS.contains(&program) {
            tracing::debug!(%program, "program not allowed, skipping");
            return Ok(0);
        }

        let args: Vec<String> = parts.map(str::to_string).collect();
        tracing::info!("Running {}", command);
        self.services
            .spawner
            .run(program, &args, &SpawnOptions::in_dir(cwd))
            .await
    }
}

fn artifact_dir(cache: &ArtifactCache) -> Result<PathBuf> {
    cache.artifact_dir().ok_or_else(|| {
        KilnError::Install {
            artifact: cache.artifact().to_string(),
            message: "version was never resolved".to_string(),
        }
        .into()
    })
}

/// Entries of `dir` that count towards it being non-empty
async fn visible_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    let mut visible = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || DIR_IGNORE.contains(&name.as_ref()) {
            continue;
        }
        visible.push(entry.path());
    }
    Ok(visible)
}

/// Remove everything inside `dir`, hidden entries included
async fn clear_dir(dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let removed = if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
