//! Child processes fed over stdin, with a deadline and bounded capture.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Deadline and capture budget for one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub timeout: Duration,
    /// Bytes kept per stream. The rest is read and counted.
    pub capture_bytes: usize,
}

/// One captured stream.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    /// Bytes read past the capture budget.
    pub dropped: u64,
}

impl Captured {
    pub fn lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// The last `max_bytes` of the stream with trailing whitespace removed.
    pub fn tail(&self, max_bytes: usize) -> String {
        let text = self.lossy();
        let text = text.trim_end();
        let mut start = text.len().saturating_sub(max_bytes);
        while !text.is_char_boundary(start) {
            start += 1;
        }
        if start == 0 {
            text.to_string()
        } else {
            format!("...{}", &text[start..])
        }
    }
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    /// The child outlived its deadline and was killed.
    pub timed_out: bool,
}

/// Spawn `cmd`, feed it `input`, and wait up to `limits.timeout`.
///
/// Input and both output pipes are serviced on their own threads, so the
/// deadline covers the whole exchange and a child that answers while still
/// reading cannot block on a full pipe. On any error the child is killed and
/// reaped before returning.
#[instrument(skip_all, fields(timeout_ms = limits.timeout.as_millis() as u64, input_bytes = input.map_or(0, <[u8]>::len)))]
pub fn run_with_input(
    mut cmd: Command,
    input: Option<&[u8]>,
    limits: ProcessLimits,
) -> Result<ProcessOutput> {
    let stdin_mode = if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };
    let mut child = cmd
        .stdin(stdin_mode)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn child process")?;

    match supervise(&mut child, input, limits) {
        Ok(output) => Ok(output),
        Err(err) => {
            // Best effort: the child may already be gone.
            let _ = child.kill();
            let _ = child.wait();
            Err(err)
        }
    }
}

fn supervise(child: &mut Child, input: Option<&[u8]>, limits: ProcessLimits) -> Result<ProcessOutput> {
    let stdout = drain_in_background(child.stdout.take(), limits.capture_bytes, "stdout")?;
    let stderr = drain_in_background(child.stderr.take(), limits.capture_bytes, "stderr")?;
    let writer = match input {
        Some(input) => {
            let pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("child stdin is not piped"))?;
            Some(feed_in_background(pipe, input.to_vec()))
        }
        None => None,
    };

    let (status, timed_out) = match child.wait_timeout(limits.timeout).context("wait for child")? {
        Some(status) => (status, false),
        None => {
            warn!(timeout_ms = limits.timeout.as_millis() as u64, "child timed out, killing");
            child.kill().context("kill child")?;
            (child.wait().context("reap killed child")?, true)
        }
    };

    // A killed child's writer may still be blocked on a pipe held open by a
    // grandchild; leave it detached.
    if let Some(writer) = writer
        && !timed_out
    {
        let written = writer
            .join()
            .map_err(|_| anyhow!("input writer thread panicked"))?;
        match written {
            Ok(()) => {}
            // A child that exits without reading closes the pipe early; its
            // exit status tells the real story.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!("child closed stdin before reading all input");
            }
            Err(err) => return Err(err).context("write child stdin"),
        }
    }

    let output = ProcessOutput {
        status,
        stdout: join_capture(stdout)?,
        stderr: join_capture(stderr)?,
        timed_out,
    };
    if output.stdout.dropped > 0 || output.stderr.dropped > 0 {
        warn!(
            stdout_dropped = output.stdout.dropped,
            stderr_dropped = output.stderr.dropped,
            "child output exceeded capture budget"
        );
    }
    debug!(exit_code = ?output.status.code(), timed_out, "child finished");
    Ok(output)
}

/// Write `input` to the child and close its stdin.
fn feed_in_background(mut pipe: ChildStdin, input: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || pipe.write_all(&input))
}

fn drain_in_background<R: Read + Send + 'static>(
    pipe: Option<R>,
    capture_bytes: usize,
    name: &str,
) -> Result<JoinHandle<io::Result<Captured>>> {
    let pipe = pipe.ok_or_else(|| anyhow!("child {name} is not piped"))?;
    Ok(thread::spawn(move || capture(pipe, capture_bytes)))
}

fn capture<R: Read>(mut reader: R, capture_bytes: usize) -> io::Result<Captured> {
    let mut bytes = Vec::new();
    reader
        .by_ref()
        .take(capture_bytes as u64)
        .read_to_end(&mut bytes)?;
    let dropped = io::copy(&mut reader, &mut io::sink())?;
    Ok(Captured { bytes, dropped })
}

fn join_capture(handle: JoinHandle<io::Result<Captured>>) -> Result<Captured> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
        .context("read child output")
}
