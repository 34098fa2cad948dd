//! Helper process lifecycle and line channels.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::pipes::{spawn_line_reader, spawn_stderr_drain, LINE_CHANNEL_CAPACITY};
use super::{SessionConfig, SessionState};
use crate::error::GowershellError;
use crate::Result;

/// Number of spawn attempts while the executable is busy.
const SPAWN_ATTEMPTS: u32 = 5;

/// A live helper process and its pipes.
struct HelperProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: mpsc::Receiver<String>,
    tasks: Vec<JoinHandle<()>>,
}

impl HelperProcess {
    fn abort_tasks(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for HelperProcess {
    fn drop(&mut self) {
        self.abort_tasks();

        if let Ok(None) = self.child.try_wait() {
            debug!("helper process dropped while running, killing");
            let _ = self.child.start_kill();
        }
    }
}

/// Owner of one helper process.
///
/// A session holds at most one OS process at a time. Dropping a session
/// without calling [`close`](Self::close) kills the helper without waiting.
pub struct ProcessSession {
    config: SessionConfig,
    state: SessionState,
    process: Option<HelperProcess>,
}

impl ProcessSession {
    /// Create a session that has not spawned its helper yet.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::NotStarted,
            process: None,
        }
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Process ID of the running helper.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.child.id())
    }

    /// Check whether the helper process is still alive.
    pub fn is_alive(&mut self) -> bool {
        match self.process.as_mut() {
            Some(process) => matches!(process.child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the helper process.
    ///
    /// Does nothing if the helper is already running. Also relaunches a
    /// closed session. On failure the state is left untouched.
    pub async fn start(&mut self) -> Result<()> {
        if self.state.is_running() {
            warn!("helper process already running");
            return Ok(());
        }

        info!("starting helper {}", self.config.executable.display());

        let mut command = Command::new(&self.config.executable);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        for (key, value) in &self.config.env {
            command.env(key, value);
        }

        let mut child = self.spawn_with_retry(&mut command).await?;

        let stdin = child
            .stdin
            .take()
            .ok_or(GowershellError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(GowershellError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let mut tasks = vec![spawn_line_reader(stdout, tx)];
        if let Some(stderr) = stderr {
            tasks.push(spawn_stderr_drain(stderr));
        }

        let pid = child.id();
        self.process = Some(HelperProcess {
            child,
            stdin: Some(stdin),
            lines: rx,
            tasks,
        });
        self.state.transition_to(SessionState::Running)?;

        info!(pid, "helper process started");
        Ok(())
    }

    async fn spawn_with_retry(&self, command: &mut Command) -> Result<Child> {
        let mut backoff = Duration::from_millis(2);
        let mut attempt = 1;
        loop {
            match command.spawn() {
                Ok(child) => return Ok(child),
                Err(source) => {
                    if is_busy(&source) && attempt < SPAWN_ATTEMPTS {
                        debug!("helper executable busy, retrying in {:?}", backoff);
                        time::sleep(backoff).await;
                        backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                        attempt += 1;
                        continue;
                    }
                    warn!(
                        "failed to launch helper {}: {}",
                        self.config.executable.display(),
                        source
                    );
                    return Err(GowershellError::Launch {
                        executable: self.config.executable.clone(),
                        source,
                    });
                }
            }
        }
    }

    /// Write one protocol line followed by a newline, then flush.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .process
            .as_mut()
            .and_then(|p| p.stdin.as_mut())
            .ok_or(GowershellError::NotRunning)?;

        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');

        stdin
            .write_all(framed.as_bytes())
            .await
            .map_err(GowershellError::Write)?;
        stdin.flush().await.map_err(GowershellError::Write)
    }

    /// Wait for the next line from the helper's stdout.
    ///
    /// Returns [`GowershellError::Timeout`] if nothing arrives in time. A
    /// line that arrives later stays queued for the next call.
    pub async fn recv_line(&mut self, timeout: Duration) -> Result<String> {
        let process = self.process.as_mut().ok_or(GowershellError::NotRunning)?;

        match time::timeout(timeout, process.lines.recv()).await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(GowershellError::OutputClosed),
            Err(_) => Err(GowershellError::Timeout(timeout)),
        }
    }

    /// Shut the helper down.
    ///
    /// Closes stdin, asks the process to terminate and waits up to the
    /// grace period before killing it. Failures are logged, never returned.
    /// Calling this on a session without a helper is a no-op.
    pub async fn close(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };

        if let Err(e) = self.state.transition_to(SessionState::Closing) {
            warn!("unexpected state while closing: {}", e);
        }
        info!(pid = process.child.id(), "closing helper process");

        drop(process.stdin.take());

        if let Err(e) = request_termination(&mut process.child) {
            debug!("termination request failed: {}", e);
        }

        match time::timeout(self.config.grace_period, process.child.wait()).await {
            Ok(Ok(status)) => debug!("helper exited with {}", status),
            Ok(Err(e)) => warn!("error waiting for helper: {}", e),
            Err(_) => {
                warn!(
                    "helper did not exit within {:?}, killing",
                    self.config.grace_period
                );
                if let Err(e) = process.child.kill().await {
                    warn!("failed to kill helper: {}", e);
                }
            }
        }

        process.abort_tasks();
        self.state = SessionState::Closed;
    }
}

#[cfg(unix)]
fn is_busy(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ETXTBSY)
}

#[cfg(not(unix))]
fn is_busy(_err: &std::io::Error) -> bool {
    false
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // SAFETY: kill(2) has no memory-safety preconditions; pid is our child.
    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
