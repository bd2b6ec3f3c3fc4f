//! Command dispatch: command name → artifact → entry point → plugin

use super::plugin::PluginLoader;
use crate::artifact::{ensure_present, ArtifactCache, CacheOptions, LATEST};
use crate::command::Invocation;
use crate::config::Settings;
use crate::product::ProductConfig;
use crate::registry::RegistryClient;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// What a dispatch ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No artifact is registered for the command
    Unmapped,
    /// The artifact is present but declares nothing to run
    NoEntryPoint,
    /// The artifact's plugin ran
    Invoked,
}

/// Routes commands to the artifacts that implement them
pub struct CommandDispatcher {
    settings: Settings,
    table: HashMap<String, String>,
    registry: Arc<dyn RegistryClient>,
    loader: Arc<dyn PluginLoader>,
}

impl CommandDispatcher {
    pub fn new<'a>(
        settings: Settings,
        table: impl IntoIterator<Item = (&'a str, &'a str)>,
        registry: Arc<dyn RegistryClient>,
        loader: Arc<dyn PluginLoader>,
    ) -> Self {
        Self {
            settings,
            table: table
                .into_iter()
                .map(|(command, artifact)| (command.to_string(), artifact.to_string()))
                .collect(),
            registry,
            loader,
        }
    }

    /// Dispatcher using the product's command table
    pub fn from_config<C: ProductConfig>(
        config: &C,
        settings: Settings,
        registry: Arc<dyn RegistryClient>,
        loader: Arc<dyn PluginLoader>,
    ) -> Self {
        Self::new(settings, config.commands().iter().copied(), registry, loader)
    }

    /// Artifact registered for `command`
    pub fn artifact_for(&self, command: &str) -> Option<&str> {
        self.table.get(command).map(String::as_str)
    }

    /// Make sure the command's artifact is cached and run its entry point.
    ///
    /// With a target-path override the artifact is used in place and never
    /// installed. Otherwise the shared dependency cache is brought up to the
    /// registry's latest version first. Install and update failures abort.
    pub async fn dispatch(&self, invocation: &Invocation) -> Result<DispatchOutcome> {
        let Some(artifact) = self.artifact_for(&invocation.command) else {
            tracing::debug!(command = %invocation.command, "no artifact registered");
            return Ok(DispatchOutcome::Unmapped);
        };

        let cache = match &self.settings.target_path {
            Some(target_path) => {
                tracing::debug!(target = %target_path.display(), "using local artifact");
                ArtifactCache::new(
                    CacheOptions {
                        target_path: target_path.clone(),
                        store_dir: None,
                        name: artifact.to_string(),
                        version: LATEST.to_string(),
                    },
                    self.registry.clone(),
                )?
            }
            None => {
                let target_path = self.settings.dependencies_dir();
                let store_dir = self.settings.dependencies_store();
                tracing::debug!(
                    target = %target_path.display(),
                    store = %store_dir.display(),
                    "using dependency cache"
                );
                let mut cache = ArtifactCache::new(
                    CacheOptions {
                        target_path,
                        store_dir: Some(store_dir),
                        name: artifact.to_string(),
                        version: LATEST.to_string(),
                    },
                    self.registry.clone(),
                )?;
                ensure_present(&mut cache)
                    .await
                    .with_context(|| format!("Failed to prepare {}", artifact))?;
                cache
            }
        };

        let Some(entry) = cache.locate_entry_point()? else {
            tracing::debug!(artifact = %cache.artifact(), "no entry point");
            return Ok(DispatchOutcome::NoEntryPoint);
        };
        tracing::debug!(entry = %entry.path.display(), "entry point");

        let plugin = self.loader.load(&entry)?;
        plugin.invoke(invocation).await?;
        Ok(DispatchOutcome::Invoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::cache::tests::FakeRegistry;
    use crate::artifact::cache_location;
    use crate::command::CommandOptions;
    use crate::config::Overrides;
    use crate::dispatch::plugin::tests::{RecordingPlugin, RecordingSpawner};
    use crate::dispatch::plugin::HostLoader;
    use crate::product::tests::TestProduct;
    use std::path::Path;

    fn settings(home: &Path, target_path: Option<&Path>) -> Settings {
        Settings::resolve(
            &TestProduct,
            home,
            |_| None,
            Overrides {
                target_path: target_path.map(Path::to_path_buf),
                ..Overrides::default()
            },
        )
        .unwrap()
    }

    struct Harness {
        registry: Arc<FakeRegistry>,
        builtin: Arc<RecordingPlugin>,
        dispatcher: CommandDispatcher,
    }

    fn harness(settings: Settings, registry: FakeRegistry) -> Harness {
        let registry = Arc::new(registry);
        let builtin = Arc::new(RecordingPlugin::default());
        let loader = HostLoader::new(Arc::new(RecordingSpawner::default()))
            .with_builtin("@kiln-cli/init", builtin.clone());
        let dispatcher =
            CommandDispatcher::from_config(&TestProduct, settings, registry.clone(), Arc::new(loader));
        Harness {
            registry,
            builtin,
            dispatcher,
        }
    }

    fn init_invocation() -> Invocation {
        Invocation::new(
            "init",
            vec!["my-app".to_string()],
            CommandOptions {
                force: true,
                ..CommandOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn test_unknown_command_is_noop() {
        let home = tempfile::tempdir().unwrap();
        let h = harness(settings(home.path(), None), FakeRegistry::new("1.0.0"));

        let outcome = h
            .dispatcher
            .dispatch(&Invocation::new("publish", vec![], CommandOptions::default()))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Unmapped);
        assert_eq!(h.registry.install_count(), 0);
    }

    #[tokio::test]
    async fn test_first_dispatch_installs_and_invokes() {
        let home = tempfile::tempdir().unwrap();
        let settings = settings(home.path(), None);
        let store = settings.dependencies_store();
        let h = harness(settings, FakeRegistry::new("1.0.0"));

        let invocation = init_invocation();
        let outcome = h.dispatcher.dispatch(&invocation).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Invoked);
        assert_eq!(h.registry.install_count(), 1);
        assert!(cache_location(&store, "@kiln-cli/init", "1.0.0").exists());
        assert_eq!(h.builtin.invocations.lock().unwrap()[0], invocation);
    }

    #[tokio::test]
    async fn test_cached_artifact_is_not_reinstalled() {
        let home = tempfile::tempdir().unwrap();
        let h = harness(settings(home.path(), None), FakeRegistry::new("1.0.0"));

        h.dispatcher.dispatch(&init_invocation()).await.unwrap();
        h.dispatcher.dispatch(&init_invocation()).await.unwrap();
        assert_eq!(h.registry.install_count(), 1);

        h.registry.publish("1.1.0");
        h.dispatcher.dispatch(&init_invocation()).await.unwrap();
        assert_eq!(h.registry.install_count(), 2);
        assert_eq!(h.builtin.invocations.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_install_failure_aborts_dispatch() {
        let home = tempfile::tempdir().unwrap();
        let mut registry = FakeRegistry::new("1.0.0");
        registry.fail_install = true;
        let h = harness(settings(home.path(), None), registry);

        assert!(h.dispatcher.dispatch(&init_invocation()).await.is_err());
        assert!(h.builtin.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_entry_point_does_nothing() {
        let home = tempfile::tempdir().unwrap();
        let mut registry = FakeRegistry::new("1.0.0");
        registry.main = None;
        let h = harness(settings(home.path(), None), registry);

        let outcome = h.dispatcher.dispatch(&init_invocation()).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::NoEntryPoint);
        assert!(h.builtin.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_target_override_skips_registry() {
        let home = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        std::fs::write(
            local.path().join("package.json"),
            r#"{ "name": "@kiln-cli/init", "version": "0.0.0-dev", "main": "lib/index.js" }"#,
        )
        .unwrap();
        let h = harness(
            settings(home.path(), Some(local.path())),
            FakeRegistry::new("1.0.0"),
        );

        let outcome = h.dispatcher.dispatch(&init_invocation()).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Invoked);
        assert_eq!(h.registry.install_count(), 0);
        assert_eq!(
            h.registry
                .latest_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }
}
