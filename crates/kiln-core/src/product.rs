//! Product configuration trait for CLI binaries
//!
//! This trait defines the identity and defaults a binary built on kiln-core
//! supplies: names, environment variables, default endpoints and the table of
//! commands that are dispatched to artifacts.

use crate::registry::npm::DEFAULT_REGISTRY_URL;

/// Configuration trait for CLI products
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Registry package the CLI itself is published as (for update notices)
    fn package_name(&self) -> &'static str;

    /// Command name to artifact name table used by the dispatcher
    fn commands(&self) -> &'static [(&'static str, &'static str)];

    /// Directory under the user's home holding caches and config
    fn default_home_dir(&self) -> &'static str;

    /// Environment variable overriding [`default_home_dir`](Self::default_home_dir)
    fn home_env(&self) -> &'static str;

    /// Environment variable pointing command dispatch at a local artifact checkout
    fn target_path_env(&self) -> &'static str;

    /// Environment variable overriding the registry URL
    fn registry_env(&self) -> &'static str;

    /// Environment variable overriding the template catalog location
    fn catalog_env(&self) -> &'static str;

    /// Default template catalog URL
    fn default_catalog_url(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// Default package registry
    fn default_registry_url(&self) -> &'static str {
        DEFAULT_REGISTRY_URL
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
