//! Fixture glue for test suites: owns a runner for the duration of a test and
//! turns mismatches into readable failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;

use crate::core::{
    domain::{AsmSyntax, ExecutionConfig, ExecutionResult, Expectation, TestInput},
    errors::{SetupError, SpawnError},
    matcher,
    traits::runner::Runner,
};
use crate::native::{block_on, runner::ProcessRunner};

pub fn make_input() -> TestInput {
    TestInput::new()
}

pub fn expect_success() -> Expectation {
    Expectation::success()
}

pub fn expect_failure(code: i32) -> Expectation {
    Expectation::failure(code)
}

#[derive(Debug, thiserror::Error)]
pub enum OutputMismatch {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("{report}")]
    Mismatch {
        report: String,
        result: ExecutionResult,
    },
}

#[derive(Debug, Clone)]
pub struct AsmTest {
    runner: Arc<dyn Runner>,
    executable: PathBuf,
    syntax: AsmSyntax,
}

impl AsmTest {
    /// Builds a [`ProcessRunner`] for `executable` and installs test logging.
    pub fn create<P: AsRef<Path>>(
        executable: P,
        syntax: AsmSyntax,
        config: ExecutionConfig,
    ) -> Result<Self, SetupError> {
        crate::logging::init();
        let runner = ProcessRunner::new(&executable, syntax, config)?;
        Ok(Self::with_runner(Arc::new(runner), executable.as_ref(), syntax))
    }

    pub fn with_runner(
        runner: Arc<dyn Runner>,
        executable: impl Into<PathBuf>,
        syntax: AsmSyntax,
    ) -> Self {
        Self {
            runner,
            executable: executable.into(),
            syntax,
        }
    }

    pub fn runner(&self) -> &Arc<dyn Runner> {
        &self.runner
    }

    /// False, with a log line, when the executable is gone and the calling
    /// test should return early.
    pub fn skip_unless_present(&self) -> bool {
        if self.runner.executable_exists() {
            return true;
        }
        tracing::warn!(
            "Skipping: executable {} is not present",
            self.executable.display()
        );
        false
    }

    /// Blocking run on a fresh runtime; [`AsmTest::run_async`] is the async
    /// form.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a tokio runtime.
    pub fn run(&self, input: &TestInput) -> Result<ExecutionResult, SpawnError> {
        block_on(self.runner.run(input))?
    }

    pub async fn run_async(&self, input: &TestInput) -> Result<ExecutionResult, SpawnError> {
        self.runner.run(input).await
    }

    /// Non-fatal check: the result on success, the full failure report
    /// otherwise.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a tokio runtime, like [`AsmTest::run`].
    pub fn check_output(
        &self,
        input: &TestInput,
        expected: &Expectation,
    ) -> Result<ExecutionResult, OutputMismatch> {
        let result = self.run(input)?;
        self.judge(input, expected, result)
    }

    pub async fn check_output_async(
        &self,
        input: &TestInput,
        expected: &Expectation,
    ) -> Result<ExecutionResult, OutputMismatch> {
        let result = self.run_async(input).await?;
        self.judge(input, expected, result)
    }

    /// Panics with the full failure report unless `expected` matches.
    #[track_caller]
    pub fn assert_output(&self, input: &TestInput, expected: &Expectation) -> ExecutionResult {
        match self.check_output(input, expected) {
            Ok(result) => result,
            Err(e) => panic!("{}", e),
        }
    }

    fn judge(
        &self,
        input: &TestInput,
        expected: &Expectation,
        result: ExecutionResult,
    ) -> Result<ExecutionResult, OutputMismatch> {
        if matcher::matches(&result, expected) {
            return Ok(result);
        }

        let report = format!(
            "Assembly test failed for executable: {}\nSyntax: {}\nArguments: {}\nExecution time: {}ms\n{}",
            self.executable.display(),
            self.syntax,
            input.argv().iter().join(" "),
            result.duration.as_millis(),
            matcher::describe_mismatch(&result, expected)
        );
        Err(OutputMismatch::Mismatch { report, result })
    }
}
