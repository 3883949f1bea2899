//! External tool execution.
//!
//! The orchestrator only talks to [`ProcessRunner`]; [`SystemRunner`] is the
//! production implementation and tests substitute a recording fake.

pub mod command;
pub mod system;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use command::{
    PipelineOutput, ProcessRunner, RunnerError, StdoutTarget, ToolCommand, ToolOutput,
};
pub use system::SystemRunner;

#[cfg(any(test, feature = "test-util"))]
pub use fake::FakeRunner;
