//! Ordered command lifecycle
//!
//! Every command runs through the same chain: environment validation,
//! argument normalization, command-specific init, then execution. A failure
//! at any step stops the chain and is reported here; it never propagates
//! past [`run_command`].

use super::invocation::Invocation;
use crate::runtime::check::{ensure_minimum, RuntimeInfo, LOWEST_NODE_VERSION};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Failure of a command whose error [`run_command`] already reported
#[derive(Debug, thiserror::Error)]
#[error("{0} failed")]
pub struct CommandFailed(pub String);

/// Behaviour a command plugs into the lifecycle
#[async_trait]
pub trait Command: Send {
    /// Minimum Node.js version the command needs, or `None` to skip the check
    fn runtime_floor(&self) -> Option<&'static str> {
        Some(LOWEST_NODE_VERSION)
    }

    /// Pull command-specific fields out of the normalized invocation
    fn init(&mut self, invocation: &Invocation) -> Result<()>;

    /// Do the work
    async fn exec(&mut self) -> Result<()>;
}

/// Drive `command` through the lifecycle with raw `argv`.
///
/// `runtime_check` reports the host runtime. Returns `false` when any step failed;
/// the failure has already been reported.
pub async fn run_command<C, P>(command: &mut C, argv: Vec<Value>, runtime_check: P) -> bool
where
    C: Command + ?Sized,
    P: FnOnce() -> RuntimeInfo + Send,
{
    match drive(command, argv, runtime_check).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("{:#}", err);
            tracing::debug!("{:?}", err);
            false
        }
    }
}

async fn drive<C, P>(command: &mut C, argv: Vec<Value>, runtime_check: P) -> Result<()>
where
    C: Command + ?Sized,
    P: FnOnce() -> RuntimeInfo + Send,
{
    if let Some(floor) = command.runtime_floor() {
        ensure_minimum(&runtime_check(), floor)?;
    }
    let invocation = Invocation::from_argv(argv)?;
    command.init(&invocation)?;
    command.exec().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<&'static str>,
        name: Option<String>,
        fail_init: bool,
        fail_exec: bool,
    }

    #[async_trait]
    impl Command for Recorder {
        fn init(&mut self, invocation: &Invocation) -> Result<()> {
            self.steps.push("init");
            self.name = invocation.first_arg().map(str::to_string);
            if self.fail_init {
                anyhow::bail!("init failed");
            }
            Ok(())
        }

        async fn exec(&mut self) -> Result<()> {
            self.steps.push("exec");
            if self.fail_exec {
                anyhow::bail!("exec failed");
            }
            Ok(())
        }
    }

    fn node(version: &str) -> impl FnOnce() -> RuntimeInfo + Send {
        let version = version.to_string();
        move || RuntimeInfo {
            name: "Node.js",
            version: Some(version),
            available: true,
        }
    }

    fn argv() -> Vec<Value> {
        vec![json!("my-app"), json!({ "command": "init" })]
    }

    #[tokio::test]
    async fn test_runs_steps_in_order() {
        let mut command = Recorder::default();
        assert!(run_command(&mut command, argv(), node("v18.0.0")).await);
        assert_eq!(command.steps, vec!["init", "exec"]);
        assert_eq!(command.name.as_deref(), Some("my-app"));
    }

    #[tokio::test]
    async fn test_old_runtime_stops_before_init() {
        let mut command = Recorder::default();
        assert!(!run_command(&mut command, argv(), node("v10.0.0")).await);
        assert!(command.steps.is_empty());
    }

    #[tokio::test]
    async fn test_bad_argv_stops_before_init() {
        let mut command = Recorder::default();
        assert!(!run_command(&mut command, vec![json!("my-app")], node("v18.0.0")).await);
        assert!(command.steps.is_empty());
    }

    #[tokio::test]
    async fn test_init_failure_skips_exec() {
        let mut command = Recorder {
            fail_init: true,
            ..Recorder::default()
        };
        assert!(!run_command(&mut command, argv(), node("v18.0.0")).await);
        assert_eq!(command.steps, vec!["init"]);
    }

    #[tokio::test]
    async fn test_exec_failure_is_caught() {
        let mut command = Recorder {
            fail_exec: true,
            ..Recorder::default()
        };
        assert!(!run_command(&mut command, argv(), node("v18.0.0")).await);
        assert_eq!(command.steps, vec!["init", "exec"]);
    }
}
