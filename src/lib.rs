//! Black-box test harness for compiled executables.
//!
//! A [`ProcessRunner`] spawns the program under test, feeds it arguments and
//! standard input, and captures stdout, stderr, the exit status and the wall
//! clock duration under a bounded timeout. An [`Expectation`] describes what the
//! captured result should look like and [`matcher`] checks it.

pub mod core;
pub mod harness;
pub mod logging;
pub mod native;
pub mod stubs;

pub use crate::core::domain::{AsmSyntax, ExecutionConfig, ExecutionResult, Expectation, TestInput};
pub use crate::core::errors::{SetupError, SpawnError};
pub use crate::core::matcher;
pub use crate::core::traits::runner::Runner;
pub use crate::harness::{AsmTest, OutputMismatch, expect_failure, expect_success, make_input};
pub use crate::native::runner::ProcessRunner;
