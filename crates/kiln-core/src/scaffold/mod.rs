//! Project scaffolding
//!
//! This module provides:
//! - The staged scaffold pipeline
//! - The prompt collaborator it asks questions through
//! - The `init` command and its builtin plugin

pub mod init;
pub mod pipeline;
pub mod prompt;

pub use init::{InitCommand, InitPlugin};
pub use pipeline::{
    ScaffoldOutcome, ScaffoldPipeline, ScaffoldRequest, ScaffoldServices, Stage, ALLOWED_PROGRAMS,
};
pub use prompt::{Progress, Prompter, SelectItem, Validator};
