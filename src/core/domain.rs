use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when the runner kills a child with SIGKILL (128 + 9).
pub const FORCED_KILL_EXIT_CODE: i32 = 128 + 9;

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_TRACE_PROGRAM: &str = "strace";

/// Outcome of a single `execute` call.
///
/// `exit_code` is the program's exit value, or 128 + N when the process died
/// from signal N. The runner's own timeout kill is SIGKILL, so a timed out run
/// reports 137, which is indistinguishable from a program that exited with 137
/// or was SIGKILLed by someone else. Only `timed_out` says the runner did it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Signal number encoded in `exit_code`, if it looks like one.
    ///
    /// Advisory only: a program may exit with 130 on its own.
    pub fn killed_by_signal(&self) -> Option<i32> {
        match self.exit_code.checked_sub(128) {
            Some(signal @ 1..=64) => Some(signal),
            _ => None,
        }
    }
}

/// Per-runner execution settings. Immutable once handed to a runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub timeout: Duration,
    pub capture_stderr: bool,
    pub use_trace: bool,
    /// Trace utility, resolved through `PATH`.
    pub trace_program: String,
    pub trace_flags: Vec<String>,
    /// `None` keeps the caller's current directory.
    pub working_directory: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            capture_stderr: true,
            use_trace: false,
            trace_program: DEFAULT_TRACE_PROGRAM.to_string(),
            trace_flags: vec!["-e".to_string(), "trace=write,read,exit_group".to_string()],
            working_directory: None,
        }
    }
}

impl ExecutionConfig {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_capture_stderr(self, capture_stderr: bool) -> Self {
        Self {
            capture_stderr,
            ..self
        }
    }

    pub fn with_trace<I, S>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            use_trace: true,
            trace_flags: flags.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_trace_program(self, program: impl Into<String>) -> Self {
        Self {
            trace_program: program.into(),
            ..self
        }
    }

    pub fn with_working_directory(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: Some(dir.into()),
            ..self
        }
    }

    /// Defaults overridden by `ASM_HARNESS_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("ASM_HARNESS_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.timeout = Duration::from_millis(ms),
                Err(e) => tracing::warn!("Ignoring ASM_HARNESS_TIMEOUT_MS={:?}: {}", raw, e),
            }
        }
        if let Some(raw) = lookup("ASM_HARNESS_CAPTURE_STDERR") {
            match parse_flag(&raw) {
                Some(flag) => config.capture_stderr = flag,
                None => tracing::warn!("Ignoring ASM_HARNESS_CAPTURE_STDERR={:?}", raw),
            }
        }
        if let Some(raw) = lookup("ASM_HARNESS_TRACE") {
            match parse_flag(&raw) {
                Some(flag) => config.use_trace = flag,
                None => tracing::warn!("Ignoring ASM_HARNESS_TRACE={:?}", raw),
            }
        }
        if let Some(program) = lookup("ASM_HARNESS_TRACE_PROGRAM").filter(|p| !p.is_empty()) {
            config.trace_program = program;
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Assembly dialect the program under test was written in. Display only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AsmSyntax {
    #[default]
    Intel,
    Att,
}

impl fmt::Display for AsmSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmSyntax::Intel => f.write_str("Intel"),
            AsmSyntax::Att => f.write_str("AT&T"),
        }
    }
}

/// Arguments and standard input for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestInput {
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl TestInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn stdin_bytes(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }
}

/// Declarative match criteria. A criterion left unset is unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expectation {
    pub exit_code: Option<i32>,
    pub stdout_equals: Option<String>,
    pub stderr_equals: Option<String>,
    pub stdout_contains: Vec<String>,
    pub stderr_contains: Vec<String>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success() -> Self {
        Self::new().exit_code(0)
    }

    pub fn failure(code: i32) -> Self {
        Self::new().exit_code(code)
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn stdout_equals(mut self, expected: impl Into<String>) -> Self {
        self.stdout_equals = Some(expected.into());
        self
    }

    pub fn stderr_equals(mut self, expected: impl Into<String>) -> Self {
        self.stderr_equals = Some(expected.into());
        self
    }

    pub fn stdout_contains(mut self, pattern: impl Into<String>) -> Self {
        self.stdout_contains.push(pattern.into());
        self
    }

    pub fn stderr_contains(mut self, pattern: impl Into<String>) -> Self {
        self.stderr_contains.push(pattern.into());
        self
    }
}
