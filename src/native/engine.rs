use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout_at};

use crate::{
    core::{
        domain::{ExecutionResult, FORCED_KILL_EXIT_CODE},
        errors::SpawnError,
        traits::command::CommandLine,
    },
    native::child::{ChildHandle, InputChannel, OutputChannel, SpawnOptions, decode_exit_status},
};

/// Spawns `command_line`, pumps stdin and drains stdout/stderr on a single
/// task until both output streams close or `timeout` runs out, then reaps the
/// child.
///
/// Stdin is written inside the same readiness loop as the reads, so a child
/// that fills its stdout pipe before consuming its input cannot deadlock us.
/// The deadline also bounds the final wait: a child that closed its streams
/// but keeps running is killed and reported as timed out.
pub async fn execute(
    command_line: &CommandLine,
    options: &SpawnOptions,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<ExecutionResult, SpawnError> {
    let start = Instant::now();
    let deadline = start + timeout;

    let mut handle = ChildHandle::spawn(command_line, options)?;
    let stdin_pipe = handle.take_stdin().ok_or(SpawnError::MissingPipe("stdin"))?;
    let stdout_pipe = handle.take_stdout().ok_or(SpawnError::MissingPipe("stdout"))?;

    let mut input = InputChannel::new(stdin_pipe, stdin.unwrap_or_default());
    let mut stdout = OutputChannel::new("stdout", stdout_pipe);
    let mut stderr = if options.capture_stderr {
        let stderr_pipe = handle.take_stderr().ok_or(SpawnError::MissingPipe("stderr"))?;
        OutputChannel::new("stderr", stderr_pipe)
    } else {
        OutputChannel::closed("stderr")
    };

    let expired = sleep_until(deadline);
    tokio::pin!(expired);

    let mut timed_out = false;
    while stdout.is_open() || stderr.is_open() {
        tokio::select! {
            biased;

            _ = &mut expired => {
                timed_out = true;
                break;
            }
            _ = input.write_chunk(), if input.is_open() => {}
            _ = stdout.read_chunk(), if stdout.is_open() => {}
            _ = stderr.read_chunk(), if stderr.is_open() => {}
        }
    }
    tracing::debug!(
        "Capture loop finished: stdin_written={}, stdout={}, stderr={}, timed_out={}",
        input.written(),
        stdout.captured().len(),
        stderr.captured().len(),
        timed_out
    );
    drop(input);

    if !timed_out {
        match timeout_at(deadline, handle.wait()).await {
            Ok(status) => {
                let status = status.map_err(SpawnError::Wait)?;
                return Ok(finish(start, status, stdout, stderr, false));
            }
            Err(_) => {
                tracing::debug!("Streams closed but child is still running");
                timed_out = true;
            }
        }
    }

    tracing::warn!(
        pid = handle.pid(),
        "Killing {} after {:?} timeout",
        command_line.display(),
        timeout
    );
    handle.kill().map_err(SpawnError::Kill)?;
    let status = handle.wait().await.map_err(SpawnError::Wait)?;

    Ok(finish(start, status, stdout, stderr, timed_out))
}

fn finish<O, E>(
    start: Instant,
    status: std::process::ExitStatus,
    stdout: OutputChannel<O>,
    stderr: OutputChannel<E>,
    timed_out: bool,
) -> ExecutionResult
where
    O: tokio::io::AsyncRead + Unpin,
    E: tokio::io::AsyncRead + Unpin,
{
    let reaped = decode_exit_status(status);
    // The direct child may have exited on its own while a descendant held the
    // pipes open; a timed-out run still reports the forced kill.
    let exit_code = if timed_out && reaped != FORCED_KILL_EXIT_CODE {
        tracing::debug!("Child exited with {} before the group was killed", reaped);
        FORCED_KILL_EXIT_CODE
    } else {
        reaped
    };
    let result = ExecutionResult {
        exit_code,
        stdout: stdout.into_captured(),
        stderr: stderr.into_captured(),
        duration: start.elapsed(),
        timed_out,
    };
    tracing::debug!(
        "Execution finished: exit_code={}, duration={:?}, timed_out={}",
        result.exit_code,
        result.duration,
        result.timed_out
    );
    result
}
