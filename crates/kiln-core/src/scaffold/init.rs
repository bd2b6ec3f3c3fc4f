//! The `init` command and its in-process plugin

use super::pipeline::{ScaffoldOutcome, ScaffoldPipeline, ScaffoldRequest, ScaffoldServices};
use super::prompt::Prompter;
use crate::command::{run_command, Command, CommandFailed, Invocation};
use crate::config::Settings;
use crate::dispatch::Plugin;
use crate::runtime::check::{check_node, RuntimeInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Scaffolds a project in `cwd`
pub struct InitCommand {
    pipeline: ScaffoldPipeline,
    prompter: Arc<dyn Prompter>,
    cwd: PathBuf,
    request: Option<ScaffoldRequest>,
    outcome: Option<ScaffoldOutcome>,
}

impl InitCommand {
    pub fn new(settings: &Settings, services: ScaffoldServices, cwd: PathBuf) -> Self {
        let prompter = services.prompter.clone();
        Self {
            pipeline: ScaffoldPipeline::new(settings, services),
            prompter,
            cwd,
            request: None,
            outcome: None,
        }
    }

    /// How the last run ended
    pub fn outcome(&self) -> Option<&ScaffoldOutcome> {
        self.outcome.as_ref()
    }
}

#[async_trait]
impl Command for InitCommand {
    fn init(&mut self, invocation: &Invocation) -> Result<()> {
        let project_name = invocation.first_arg().map(str::to_string);
        let force = invocation.options.force;
        tracing::debug!(?project_name, force, "init");
        self.request = Some(ScaffoldRequest {
            project_name,
            force,
            cwd: self.cwd.clone(),
        });
        Ok(())
    }

    async fn exec(&mut self) -> Result<()> {
        let request = self
            .request
            .take()
            .context("init must run before exec")?;
        let outcome = self.pipeline.run(&request).await?;

        match &outcome {
            ScaffoldOutcome::Done(info) => {
                self.prompter
                    .success(&format!("Created {} {}", info.name(), info.version()))?;
            }
            ScaffoldOutcome::Cancelled => {
                self.prompter.info("Nothing was changed")?;
            }
            ScaffoldOutcome::ComponentReserved => {
                self.prompter.warning("Component scaffolding is not available yet")?;
            }
        }
        self.outcome = Some(outcome);
        Ok(())
    }
}

/// Runs [`InitCommand`] in-process when the init artifact is dispatched
pub struct InitPlugin {
    settings: Settings,
    services: ScaffoldServices,
    cwd: Option<PathBuf>,
    runtime_check: fn() -> RuntimeInfo,
}

impl InitPlugin {
    pub fn new(settings: Settings, services: ScaffoldServices) -> Self {
        Self {
            settings,
            services,
            cwd: None,
            runtime_check: check_node,
        }
    }

    /// Scaffold into `cwd` instead of the process working directory
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    pub fn with_runtime_check(mut self, runtime_check: fn() -> RuntimeInfo) -> Self {
        self.runtime_check = runtime_check;
        self
    }
}

#[async_trait]
impl Plugin for InitPlugin {
    async fn invoke(&self, invocation: &Invocation) -> Result<()> {
        let cwd = match &self.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        let mut command = InitCommand::new(&self.settings, self.services.clone(), cwd);
        if run_command(&mut command, invocation.to_argv(), self.runtime_check).await {
            Ok(())
        } else {
            Err(CommandFailed(invocation.command.clone()).into())
        }
    }
}
