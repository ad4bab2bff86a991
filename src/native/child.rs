use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::core::{errors::SpawnError, traits::command::CommandLine};

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Clone, Debug, Default)]
pub struct SpawnOptions {
    pub working_directory: Option<PathBuf>,
    /// When false stderr goes to the null device instead of a pipe.
    pub capture_stderr: bool,
}

/// A spawned child running in its own process group.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    pid: Option<u32>,
}

impl ChildHandle {
    pub fn spawn(command_line: &CommandLine, options: &SpawnOptions) -> Result<Self, SpawnError> {
        let stderr = if options.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut cmd = Command::new(&command_line.program);
        cmd.args(&command_line.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &options.working_directory {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| SpawnError::Spawn {
            program: command_line.display(),
            source,
        })?;
        let pid = child.id();
        tracing::debug!(pid, "Spawned {}", command_line.display());

        Ok(Self { child, pid })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Sends SIGKILL to the whole process group, so anything the child forked
    /// (a tracer's tracee, a shell's command) dies with it.
    pub fn kill(&mut self) -> io::Result<()> {
        if let Some(pid) = self.pid {
            match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                Ok(()) => {
                    tracing::debug!(pid, "Sent SIGKILL to process group");
                    return Ok(());
                }
                Err(Errno::ESRCH) => {
                    tracing::debug!(pid, "Process group already gone");
                }
                Err(e) => {
                    tracing::warn!(pid, "Failed to kill process group: {}", e);
                }
            }
        }

        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait().await?;
        // Reaped: the id may be recycled from here on.
        self.pid = None;
        Ok(status)
    }
}

/// Exit value for a normal exit, 128 + N for death by signal N.
pub fn decode_exit_status(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

/// Feeds a payload into the child's stdin a chunk at a time and closes the
/// pipe once everything is written.
#[derive(Debug)]
pub struct InputChannel<'a, W> {
    writer: Option<W>,
    data: &'a [u8],
    written: usize,
}

impl<'a, W: AsyncWrite + Unpin> InputChannel<'a, W> {
    /// An empty payload closes the pipe right away.
    pub fn new(writer: W, data: &'a [u8]) -> Self {
        Self {
            writer: (!data.is_empty()).then_some(writer),
            data,
            written: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes whatever the pipe accepts. Returns the number of bytes written;
    /// a reader that went away just closes the channel.
    pub async fn write_chunk(&mut self) -> usize {
        let Some(writer) = self.writer.as_mut() else {
            return 0;
        };

        let end = self.data.len().min(self.written + CHUNK_SIZE);
        match writer.write(&self.data[self.written..end]).await {
            Ok(0) => {
                self.close();
                0
            }
            Ok(n) => {
                self.written += n;
                if self.written == self.data.len() {
                    self.close();
                }
                n
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    tracing::debug!(
                        "Child stopped reading stdin after {} of {} bytes",
                        self.written,
                        self.data.len()
                    );
                } else {
                    tracing::warn!("Error writing stdin: {}", e);
                }
                self.close();
                0
            }
        }
    }

    fn close(&mut self) {
        self.writer = None;
    }
}

/// Accumulates one output stream of the child in arrival order.
#[derive(Debug)]
pub struct OutputChannel<R> {
    name: &'static str,
    reader: Option<R>,
    captured: Vec<u8>,
}

impl<R: AsyncRead + Unpin> OutputChannel<R> {
    pub fn new(name: &'static str, reader: R) -> Self {
        Self {
            name,
            reader: Some(reader),
            captured: Vec::new(),
        }
    }

    /// A channel that is not monitored at all.
    pub fn closed(name: &'static str) -> Self {
        Self {
            name,
            reader: None,
            captured: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Reads one available chunk. Returns 0 and stops monitoring once the
    /// stream hits end-of-file or fails.
    pub async fn read_chunk(&mut self) -> usize {
        let Some(reader) = self.reader.as_mut() else {
            return 0;
        };

        self.captured.reserve(CHUNK_SIZE);
        match reader.read_buf(&mut self.captured).await {
            Ok(0) => {
                tracing::debug!("{} reached EOF after {} bytes", self.name, self.captured.len());
                self.reader = None;
                0
            }
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Error reading {}: {}", self.name, e);
                self.reader = None;
                0
            }
        }
    }

    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    pub fn into_captured(self) -> Vec<u8> {
        self.captured
    }
}
