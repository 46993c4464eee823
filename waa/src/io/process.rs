//! Run child processes (npm, npx, pgrep) with a timeout and bounded output.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Bytes of stdout/stderr kept per stream.
pub const DEFAULT_OUTPUT_LIMIT: usize = 200_000;

/// How long output is still collected after the child is gone. Descendants
/// that inherited the pipes can hold them open past this.
const READER_GRACE: Duration = Duration::from_secs(2);

/// What happens to a command still running at its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTimeout {
    /// Kill the child and every process in its process group.
    KillGroup,
    /// Leave it running; its output keeps draining in the background.
    Detach,
}

/// Captured child process output, decoded lossily as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was killed (timeout or signal) or detached.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// stdout followed by stderr, for parsers that scan both.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Build a command running `program args...` inside `cwd`.
pub fn command(program: &str, args: &[&str], cwd: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);
    cmd
}

/// Run `cmd`, killing its whole process group after `timeout`.
pub fn run_with_timeout(cmd: Command, timeout: Duration, output_limit: usize) -> Result<ProcessOutput> {
    run_with_policy(cmd, timeout, output_limit, OnTimeout::KillGroup)
}

/// Run `cmd` in its own process group, applying `on_timeout` if it outlives
/// `timeout`.
///
/// Output is drained on reader threads while the child runs so a chatty
/// process cannot block on a full pipe. Bytes past `output_limit` are
/// discarded.
#[instrument(skip_all, fields(program = ?cmd.get_program(), timeout_secs = timeout.as_secs()))]
pub fn run_with_policy(
    mut cmd: Command,
    timeout: Duration,
    output_limit: usize,
    on_timeout: OnTimeout,
) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    debug!("spawning child process");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn {:?}", cmd.get_program()))?;

    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, Stream::Stdout, output_limit, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, Stream::Stderr, output_limit, tx);
    }

    let (exit_code, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status.code(), false),
        None if on_timeout == OnTimeout::Detach => {
            debug!("command still running at timeout, detaching");
            (None, true)
        }
        None => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing process group");
            kill_group(&mut child)?;
            let status = child.wait().context("wait command after kill")?;
            (status.code(), true)
        }
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let deadline = Instant::now() + READER_GRACE;
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok((Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
            Ok((Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("output pipes still open, returning partial output");
                break;
            }
        }
    }

    debug!(?exit_code, timed_out, "command finished");
    Ok(ProcessOutput {
        exit_code,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
    })
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Forward up to `limit` bytes of `reader`, then keep draining until EOF.
fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    limit: usize,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut sent = 0usize;
        let mut chunk = [0u8; 8192];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    debug!(?stream, %err, "output read failed");
                    break;
                }
            };
            let keep = n.min(limit.saturating_sub(sent));
            if keep > 0 {
                sent += keep;
                // The receiver is gone once the caller stopped waiting.
                let _ = tx.send((stream, chunk[..keep].to_vec()));
            }
        }
    });
}

fn kill_group(child: &mut Child) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let pgid = i32::try_from(child.id()).context("child pid out of range")?;
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) => return Ok(()),
            Err(err) => debug!(%err, "killpg failed, killing child only"),
        }
    }
    child.kill().context("kill command")
}
