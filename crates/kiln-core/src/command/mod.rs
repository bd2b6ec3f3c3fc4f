//! Command invocations and the shared command lifecycle

pub mod invocation;
pub mod lifecycle;

pub use invocation::{CommandOptions, Invocation};
pub use lifecycle::{run_command, Command, CommandFailed};
