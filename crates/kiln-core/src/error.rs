//! Error types shared by the cache, registry and scaffolding layers.

use std::path::PathBuf;

/// Result alias for fallible kiln-core operations.
pub type KilnResult<T> = Result<T, KilnError>;

/// Errors raised by kiln-core.
///
/// Every variant except [`KilnError::Validation`] is fatal to the current run.
#[derive(Debug, thiserror::Error)]
pub enum KilnError {
    /// Invalid construction options or settings.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Bad user input. Prompts re-ask instead of failing.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A cache path could not be created, read or written.
    #[error("cache error at {}: {message}", path.display())]
    CacheState { path: PathBuf, message: String },

    /// The registry could not be reached or returned something unusable.
    #[error("registry error: {message}")]
    Registry { message: String },

    /// Materializing an artifact into the store failed.
    #[error("failed to install {artifact}: {message}")]
    Install { artifact: String, message: String },

    /// A template declared a kind this tool does not know how to install.
    #[error("unrecognised template kind '{kind}'")]
    UnknownKind { kind: String },

    /// The template's dependency install command exited unsuccessfully.
    #[error("dependency install failed: '{command}' exited with code {code}")]
    DependencyInstall { command: String, code: i32 },

    /// The host runtime does not satisfy the minimum version.
    #[error("{runtime} {required} or newer is required (found {found})")]
    Environment {
        runtime: &'static str,
        required: String,
        found: String,
    },
}

impl KilnError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn cache_state(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::CacheState {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }
}
