//! Settings resolution for the CLI

pub mod settings;

pub use settings::{Overrides, Settings, SETTINGS_FILE};
