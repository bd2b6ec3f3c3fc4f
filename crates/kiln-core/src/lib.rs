//! Kiln Core - Artifact cache, command dispatch and project scaffolding
//!
//! Commands of a kiln-based CLI are distributed as versioned registry
//! packages. This library resolves a command to its package, keeps a local
//! cache of the right version and hands control to the package's entry point.
//! The builtin `init` command uses the same cache for project templates.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Cache paths, registry access, template
//!   catalog, copying and rendering, runtime checks, process spawning
//! - **Layer 2: Workflow Orchestration** - `ProductConfig`, `Settings`, the
//!   command lifecycle, the dispatcher and the scaffold pipeline
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompter and terminal helpers
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use kiln_core::{ArtifactCache, CacheOptions, NpmRegistry};
//!
//! let registry = Arc::new(NpmRegistry::new(url, "my-cli"));
//! let mut cache = ArtifactCache::new(
//!     CacheOptions {
//!         target_path: home.join("dependencies"),
//!         store_dir: Some(home.join("dependencies/node_modules")),
//!         name: "@my-cli/init".into(),
//!         version: "latest".into(),
//!     },
//!     registry,
//! )?;
//! kiln_core::artifact::ensure_present(&mut cache).await?;
//! let entry = cache.locate_entry_point()?;
//! ```

pub mod artifact;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod product;
pub mod registry;
pub mod runtime;
pub mod scaffold;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use artifact::{ArtifactCache, ArtifactRef, CacheOptions, EntryPoint};
pub use command::{run_command, Command, CommandFailed, CommandOptions, Invocation};
pub use config::{Overrides, Settings};
pub use dispatch::{CommandDispatcher, DispatchOutcome, HostLoader, Plugin, PluginLoader};
pub use error::{KilnError, KilnResult};
pub use product::ProductConfig;
pub use registry::{NpmRegistry, RegistryClient};
pub use runtime::{check_node, RuntimeInfo, TokioSpawner};
pub use scaffold::{InitPlugin, ScaffoldServices};
pub use templates::{update_notice, CatalogFetcher, TemplateCatalog};

#[cfg(feature = "tui")]
pub use tui::ClackPrompter;
