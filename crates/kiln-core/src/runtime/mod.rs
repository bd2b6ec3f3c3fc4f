//! Runtime detection and process execution
//!
//! This module provides:
//! - Node.js detection and minimum-version checks
//! - A process spawner used for template commands and script plugins

pub mod check;
pub mod spawn;

pub use check::{check_node, ensure_minimum, RuntimeInfo, LOWEST_NODE_VERSION};
pub use spawn::{ProcessSpawner, SpawnOptions, TokioSpawner};
