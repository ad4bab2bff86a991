//! Checks an [`ExecutionResult`] against an [`Expectation`].
//!
//! Every specified criterion is evaluated, never stopping at the first failure,
//! so a single diagnostic lists everything that went wrong.

use std::fmt;

use crate::core::domain::{ExecutionResult, Expectation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("Stdout"),
            Stream::Stderr => f.write_str("Stderr"),
        }
    }
}

/// One unmet criterion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    ExitCode {
        expected: i32,
        actual: i32,
        timed_out: bool,
    },
    Equals {
        stream: Stream,
        expected: String,
        actual: String,
    },
    MissingPattern {
        stream: Stream,
        pattern: String,
        actual: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ExitCode {
                expected,
                actual,
                timed_out,
            } => {
                write!(f, "Exit code mismatch: expected {}, got {}", expected, actual)?;
                if *timed_out {
                    f.write_str(" (killed by the runner after timeout)")?;
                }
                Ok(())
            }
            Violation::Equals {
                stream,
                expected,
                actual,
            } => write!(
                f,
                "{} mismatch:\nExpected: '{}'\nActual: '{}'",
                stream, expected, actual
            ),
            Violation::MissingPattern {
                stream,
                pattern,
                actual,
            } => write!(
                f,
                "{} missing pattern: '{}'\nActual {}: '{}'",
                stream,
                pattern,
                stream.to_string().to_lowercase(),
                actual
            ),
        }
    }
}

/// All unmet criteria, in a stable order: exit code, exact stdout, exact
/// stderr, stdout patterns, stderr patterns.
pub fn violations(result: &ExecutionResult, expectation: &Expectation) -> Vec<Violation> {
    let mut found = Vec::new();

    if let Some(expected) = expectation.exit_code {
        if result.exit_code != expected {
            found.push(Violation::ExitCode {
                expected,
                actual: result.exit_code,
                timed_out: result.timed_out,
            });
        }
    }

    let streams = [
        (Stream::Stdout, &result.stdout, &expectation.stdout_equals),
        (Stream::Stderr, &result.stderr, &expectation.stderr_equals),
    ];
    for (stream, actual, expected) in streams {
        if let Some(expected) = expected {
            if actual.as_slice() != expected.as_bytes() {
                found.push(Violation::Equals {
                    stream,
                    expected: expected.clone(),
                    actual: String::from_utf8_lossy(actual).into_owned(),
                });
            }
        }
    }

    let patterns = [
        (Stream::Stdout, &result.stdout, &expectation.stdout_contains),
        (Stream::Stderr, &result.stderr, &expectation.stderr_contains),
    ];
    for (stream, actual, wanted) in patterns {
        for pattern in wanted {
            if !contains(actual, pattern.as_bytes()) {
                found.push(Violation::MissingPattern {
                    stream,
                    pattern: pattern.clone(),
                    actual: String::from_utf8_lossy(actual).into_owned(),
                });
            }
        }
    }

    found
}

pub fn matches(result: &ExecutionResult, expectation: &Expectation) -> bool {
    violations(result, expectation).is_empty()
}

/// One entry per unmet criterion, each terminated by a newline. Empty when
/// everything matches.
pub fn describe_mismatch(result: &ExecutionResult, expectation: &Expectation) -> String {
    violations(result, expectation)
        .iter()
        .map(|violation| format!("{}\n", violation))
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
