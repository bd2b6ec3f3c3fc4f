//! Loading artifact entry points as callable plugins
//!
//! An entry point becomes a [`Plugin`] in one of two ways. Packages whose
//! name is registered as a builtin run in-process; the cached artifact still
//! decides whether and which version is available. Everything else runs as
//! a child process: JavaScript entries through `node`, other files directly.
//! Child processes get the invocation's argv as JSON in [`ARGV_ENV`] and the
//! positional arguments on their command line.

use crate::artifact::EntryPoint;
use crate::command::Invocation;
use crate::runtime::spawn::{ProcessSpawner, SpawnOptions};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable carrying the JSON argv for script plugins
pub const ARGV_ENV: &str = "KILN_ARGV";

/// Entry file extensions run through Node.js
const NODE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs"];

/// Something an artifact exposes to be invoked with a command's arguments
#[async_trait]
pub trait Plugin: Send + Sync {
    async fn invoke(&self, invocation: &Invocation) -> Result<()>;
}

/// Turns a located entry point into a plugin
pub trait PluginLoader: Send + Sync {
    fn load(&self, entry: &EntryPoint) -> Result<Arc<dyn Plugin>>;
}

/// Plugin backed by a script or executable in the artifact
pub struct ScriptPlugin {
    entry: PathBuf,
    spawner: Arc<dyn ProcessSpawner>,
}

impl ScriptPlugin {
    pub fn new(entry: PathBuf, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { entry, spawner }
    }

    /// Program and leading arguments used to start the entry file
    fn launcher(entry: &Path) -> (String, Vec<String>) {
        let is_node = entry
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| NODE_EXTENSIONS.contains(&ext));
        let entry_str = entry.to_string_lossy().into_owned();
        if is_node {
            ("node".to_string(), vec![entry_str])
        } else {
            (entry_str, Vec::new())
        }
    }
}

#[async_trait]
impl Plugin for ScriptPlugin {
    async fn invoke(&self, invocation: &Invocation) -> Result<()> {
        let (program, mut args) = Self::launcher(&self.entry);
        args.extend(invocation.args.iter().cloned());

        let argv = serde_json::to_string(&invocation.to_argv()).context("Failed to encode argv")?;
        let mut options = SpawnOptions::default().with_env(ARGV_ENV, argv);
        options.cwd = std::env::current_dir().ok();

        let code = self.spawner.run(&program, &args, &options).await?;
        if code != 0 {
            anyhow::bail!("{} exited with code {}", self.entry.display(), code);
        }
        Ok(())
    }
}

/// Default loader: registered builtins first, script plugins otherwise
pub struct HostLoader {
    builtins: HashMap<String, Arc<dyn Plugin>>,
    spawner: Arc<dyn ProcessSpawner>,
}

impl HostLoader {
    pub fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            builtins: HashMap::new(),
            spawner,
        }
    }

    /// Run `package` in-process with `plugin` instead of spawning its entry file
    pub fn with_builtin(mut self, package: impl Into<String>, plugin: Arc<dyn Plugin>) -> Self {
        self.builtins.insert(package.into(), plugin);
        self
    }
}

impl PluginLoader for HostLoader {
    fn load(&self, entry: &EntryPoint) -> Result<Arc<dyn Plugin>> {
        if let Some(builtin) = self.builtins.get(&entry.package.name) {
            tracing::debug!(package = %entry.package.name, "using builtin plugin");
            return Ok(builtin.clone());
        }
        tracing::debug!(entry = %entry.path.display(), "using script plugin");
        Ok(Arc::new(ScriptPlugin::new(
            entry.path.clone(),
            self.spawner.clone(),
        )))
    }
}
