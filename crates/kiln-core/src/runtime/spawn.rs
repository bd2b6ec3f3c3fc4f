//! Child process execution with inherited terminal I/O

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;

/// Working directory and extra environment for a spawned program
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl SpawnOptions {
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Capability for running external programs to completion
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Run `program` with `args`, sharing this process's stdio, and return its exit code
    async fn run(&self, program: &str, args: &[String], options: &SpawnOptions) -> Result<i32>;
}

/// Spawner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl TokioSpawner {
    fn command(program: &str, args: &[String]) -> TokioCommand {
        // npm and friends are .cmd shims on Windows and need the shell to resolve
        if cfg!(windows) {
            let mut command = TokioCommand::new("cmd");
            command.arg("/c").arg(program).args(args);
            command
        } else {
            let mut command = TokioCommand::new(program);
            command.args(args);
            command
        }
    }
}

#[async_trait]
impl ProcessSpawner for TokioSpawner {
    async fn run(&self, program: &str, args: &[String], options: &SpawnOptions) -> Result<i32> {
        let mut command = Self::command(program, args);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &options.env {
            command.env(key, value);
        }

        tracing::debug!(program, ?args, cwd = ?options.cwd, "spawning");
        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        // Killed by a signal: no code, report as failure
        Ok(status.code().unwrap_or(-1))
    }
}
