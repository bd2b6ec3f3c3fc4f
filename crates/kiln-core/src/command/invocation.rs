//! Command invocations and their argv wire form
//!
//! Plugins receive their arguments as a JSON array whose last element is
//! always the options object; everything before it is positional.

use crate::error::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Flags and settings that travel with a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOptions {
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub debug: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,

    /// Command-specific values, e.g. project answers for custom templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Options object as it appears at the end of argv
#[derive(Debug, Serialize, Deserialize)]
struct WireOptions {
    #[serde(default)]
    command: String,
    #[serde(flatten)]
    options: CommandOptions,
}

/// A command name with positional arguments and tagged options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
    pub options: CommandOptions,
}

impl Invocation {
    pub fn new(command: impl Into<String>, args: Vec<String>, options: CommandOptions) -> Self {
        Self {
            command: command.into(),
            args,
            options,
        }
    }

    /// First positional argument, if any
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Encode as argv: positional strings followed by the options object
    pub fn to_argv(&self) -> Vec<Value> {
        let mut argv: Vec<Value> = self.args.iter().cloned().map(Value::String).collect();
        let wire = WireOptions {
            command: self.command.clone(),
            options: self.options.clone(),
        };
        argv.push(serde_json::to_value(wire).unwrap_or_else(|_| Value::Object(Default::default())));
        argv
    }

    /// Split argv into positional arguments and the trailing options object.
    ///
    /// The last element is always the options object, never a positional
    /// argument; an empty argv or a non-object last element is rejected.
    pub fn from_argv(mut argv: Vec<Value>) -> KilnResult<Self> {
        let last = argv
            .pop()
            .ok_or_else(|| KilnError::configuration("command arguments must not be empty"))?;
        if !last.is_object() {
            return Err(KilnError::configuration(
                "the last command argument must be an options object",
            ));
        }
        let wire: WireOptions = serde_json::from_value(last)
            .map_err(|e| KilnError::configuration(format!("invalid command options: {}", e)))?;

        let args = argv
            .into_iter()
            .map(|value| match value {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        Ok(Self {
            command: wire.command,
            args,
            options: wire.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_element_is_options() {
        let invocation = Invocation::from_argv(vec![
            json!("my-app"),
            json!("extra"),
            json!({ "command": "init", "force": true }),
        ])
        .unwrap();

        assert_eq!(invocation.command, "init");
        assert_eq!(invocation.args, vec!["my-app", "extra"]);
        assert!(invocation.options.force);
        assert_eq!(invocation.first_arg(), Some("my-app"));
    }

    #[test]
    fn test_only_options() {
        let invocation = Invocation::from_argv(vec![json!({ "command": "init" })]).unwrap();
        assert!(invocation.args.is_empty());
        assert!(!invocation.options.force);
    }

    #[test]
    fn test_empty_argv_rejected() {
        assert!(matches!(
            Invocation::from_argv(vec![]),
            Err(KilnError::Configuration { .. })
        ));
    }

    #[test]
    fn test_trailing_positional_rejected() {
        assert!(matches!(
            Invocation::from_argv(vec![json!({ "force": true }), json!("my-app")]),
            Err(KilnError::Configuration { .. })
        ));
    }

    #[test]
    fn test_argv_wire_form() {
        let mut options = CommandOptions {
            force: true,
            ..CommandOptions::default()
        };
        options.extra.insert("projectName".to_string(), json!("demo"));
        let invocation = Invocation::new("init", vec!["demo".to_string()], options);

        let argv = invocation.to_argv();
        assert_eq!(argv.len(), 2);
        assert_eq!(argv[0], json!("demo"));
        assert_eq!(argv[1]["command"], json!("init"));
        assert_eq!(argv[1]["force"], json!(true));
        assert_eq!(argv[1]["extra"]["projectName"], json!("demo"));
        assert_eq!(Invocation::from_argv(argv).unwrap(), invocation);
    }
}
