//! Prompt collaborator used by the scaffold pipeline
//!
//! The pipeline only needs answers; how they are asked is up to the
//! implementation. The interactive terminal version lives in `tui`.

use crate::templates::project::validate_project_name;
use crate::templates::version::normalize_version;
use anyhow::Result;

/// Checks an answer and returns the value to keep, or a message to re-prompt with
pub type Validator = fn(&str) -> std::result::Result<String, String>;

/// One entry of a selection prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub label: String,
    pub hint: String,
}

impl SelectItem {
    pub fn new(label: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hint: hint.into(),
        }
    }
}

/// Asks the user questions and shows progress notes
pub trait Prompter: Send + Sync {
    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Pick one of `items`; returns its index
    fn select(&self, message: &str, items: &[SelectItem], default: usize) -> Result<usize>;

    /// Free-text answer, repeated until `validate` accepts it
    fn input(&self, message: &str, default: Option<&str>, validate: Validator) -> Result<String>;

    fn info(&self, message: &str) -> Result<()>;

    fn success(&self, message: &str) -> Result<()>;

    fn warning(&self, message: &str) -> Result<()>;

    /// Start a progress indicator for a long-running step
    fn progress(&self, message: &str) -> Box<dyn Progress>;
}

/// Running progress indicator returned by [`Prompter::progress`]
pub trait Progress: Send + Sync {
    fn finish(&self, message: &str);

    fn fail(&self, message: &str);
}

/// Validator for project names
pub fn project_name_answer(value: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    validate_project_name(value)
        .map(|_| value.to_string())
        .map_err(|err| err.to_string())
}

/// Validator for project versions; keeps the normalized form
pub fn version_answer(value: &str) -> std::result::Result<String, String> {
    normalize_version(value).map_err(|err| err.to_string())
}
