use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::{
    domain::{AsmSyntax, ExecutionConfig, ExecutionResult, TestInput},
    errors::{SetupError, SpawnError},
    traits::{
        command::{CommandLineBuilder, DirectCommand, TracedCommand},
        runner::Runner,
    },
};
use crate::native::{block_on, child::SpawnOptions, engine};

/// Runs one validated executable under a fixed [`ExecutionConfig`].
///
/// Calls are independent: every `execute` owns its own pipes and child, so a
/// runner can be shared between threads.
#[derive(Debug)]
pub struct ProcessRunner {
    executable: PathBuf,
    syntax: AsmSyntax,
    config: ExecutionConfig,
    command_line: Box<dyn CommandLineBuilder>,
}

impl ProcessRunner {
    /// Validates `executable` and picks the command line from
    /// `config.use_trace`.
    pub fn new<P: AsRef<Path>>(
        executable: P,
        syntax: AsmSyntax,
        config: ExecutionConfig,
    ) -> Result<Self, SetupError> {
        let command_line: Box<dyn CommandLineBuilder> = if config.use_trace {
            Box::new(TracedCommand::new(
                config.trace_program.clone(),
                config.trace_flags.clone(),
            ))
        } else {
            Box::new(DirectCommand)
        };

        Self::with_command_line(executable, syntax, config, command_line)
    }

    /// Same as [`ProcessRunner::new`] but always runs under the trace utility.
    pub fn traced<P: AsRef<Path>>(
        executable: P,
        syntax: AsmSyntax,
        config: ExecutionConfig,
    ) -> Result<Self, SetupError> {
        Self::new(
            executable,
            syntax,
            ExecutionConfig {
                use_trace: true,
                ..config
            },
        )
    }

    pub fn with_command_line<P: AsRef<Path>>(
        executable: P,
        syntax: AsmSyntax,
        config: ExecutionConfig,
        command_line: Box<dyn CommandLineBuilder>,
    ) -> Result<Self, SetupError> {
        let executable = executable.as_ref().to_path_buf();
        validate_executable(&executable)?;

        tracing::debug!(
            "Runner ready: executable={}, syntax={}, command_line={:?}",
            executable.display(),
            syntax,
            command_line
        );

        Ok(Self {
            executable,
            syntax,
            config,
            command_line,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn syntax(&self) -> AsmSyntax {
        self.syntax
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Existence and regular-file check only; execute permission is not
    /// looked at.
    pub fn executable_exists(&self) -> bool {
        self.executable.is_file()
    }

    /// Runs the executable once and blocks until it finishes or times out.
    ///
    /// Builds its own runtime; use [`Runner::run`] from async code.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a tokio runtime.
    pub fn execute(
        &self,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<ExecutionResult, SpawnError> {
        block_on(self.execute_async(args, stdin))?
    }

    #[tracing::instrument(
        skip(self, args, stdin),
        fields(run_id = %Uuid::new_v4(), executable = %self.executable.display())
    )]
    pub async fn execute_async(
        &self,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<ExecutionResult, SpawnError> {
        let command_line = self.command_line.build(&self.executable, args);
        let options = SpawnOptions {
            working_directory: self.config.working_directory.clone(),
            capture_stderr: self.config.capture_stderr,
        };

        tracing::debug!(
            "Executing {} with {} bytes of stdin",
            command_line.display(),
            stdin.map_or(0, <[u8]>::len)
        );
        engine::execute(&command_line, &options, stdin, self.config.timeout).await
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, input: &TestInput) -> Result<ExecutionResult, SpawnError> {
        self.execute_async(input.argv(), input.stdin_bytes()).await
    }

    fn executable_exists(&self) -> bool {
        ProcessRunner::executable_exists(self)
    }
}

fn validate_executable(path: &Path) -> Result<(), SetupError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SetupError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(SetupError::Metadata {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_file() {
        return Err(SetupError::NotRegularFile {
            path: path.to_path_buf(),
        });
    }

    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(SetupError::NotExecutable {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}
