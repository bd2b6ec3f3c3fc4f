//! Dynamic command dispatch
//!
//! This module provides:
//! - The command dispatcher that resolves commands to cached artifacts
//! - Plugin loading for builtin and script entry points

pub mod dispatcher;
pub mod plugin;

pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use plugin::{HostLoader, Plugin, PluginLoader, ScriptPlugin, ARGV_ENV};
