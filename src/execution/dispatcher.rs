//! Request dispatch over a helper session.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use super::command::CommandRequest;
use super::result::ResponseEnvelope;
use crate::error::GowershellError;
use crate::session::{ProcessSession, SessionConfig, SessionState};
use crate::Result;

/// Client for one helper process.
///
/// Every exchange holds the session gate from the moment the request is
/// written until its response line has been read, so callers sharing a
/// dispatcher (for example through an `Arc`) are served one at a time in
/// arrival order. `close` waits on the same gate.
pub struct CommandDispatcher {
    session: Mutex<ProcessSession>,
    default_timeout: Duration,
}

impl CommandDispatcher {
    /// Create a dispatcher. The helper is spawned on first use.
    pub fn new(config: SessionConfig) -> Self {
        let default_timeout = config.default_timeout;
        Self {
            session: Mutex::new(ProcessSession::new(config)),
            default_timeout,
        }
    }

    /// Timeout applied to requests that do not carry their own.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Spawn the helper now instead of on the first dispatch.
    pub async fn start(&self) -> Result<()> {
        self.session.lock().await.start().await
    }

    /// Current lifecycle state of the session.
    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Process ID of the running helper.
    pub async fn pid(&self) -> Option<u32> {
        self.session.lock().await.pid()
    }

    /// Check whether the helper process is alive.
    pub async fn is_healthy(&self) -> bool {
        self.session.lock().await.is_alive()
    }

    /// Close the current helper and spawn a fresh one.
    pub async fn restart(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.close().await;
        session.start().await
    }

    /// Shut the helper down. Safe to call repeatedly.
    pub async fn close(&self) {
        self.session.lock().await.close().await;
    }

    /// Execute a request with its own timeout, or the default one.
    pub async fn execute(&self, request: &CommandRequest) -> Result<ResponseEnvelope> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        self.dispatch(request, timeout).await
    }

    /// Send one request and wait up to `timeout` for its response.
    ///
    /// The deadline covers both writing the request and reading the reply.
    /// Timeouts, write failures, undecodable responses and a dead helper
    /// are all reported as envelopes with `error` set. `Err` is returned
    /// only when the helper cannot be launched or the session was closed.
    ///
    /// The helper is started lazily only on a dispatcher that was never
    /// started. Once [`close`](Self::close) has run, dispatch keeps failing
    /// with [`GowershellError::SessionClosed`] instead of relaunching; call
    /// [`start`](Self::start) or [`restart`](Self::restart) to bring the
    /// helper back.
    ///
    /// A timed-out request is abandoned, not cancelled: the helper may
    /// still answer it later, and that late line will be read as the
    /// response to the next request on this session.
    pub async fn dispatch(
        &self,
        request: &CommandRequest,
        timeout: Duration,
    ) -> Result<ResponseEnvelope> {
        let mut session = self.session.lock().await;

        match session.state() {
            SessionState::Running => {}
            state if state.can_autostart() => session.start().await?,
            _ => return Err(GowershellError::SessionClosed),
        }

        info!(
            "executing command: {} (type: {}, mode: {})",
            request.command,
            request.kind,
            request.window_mode()
        );

        let envelope = match exchange(&mut session, request, timeout).await {
            Ok(envelope) => envelope,
            Err(err) => {
                if matches!(err, GowershellError::Timeout(_)) {
                    warn!(
                        "no response within {:?}; a late reply may be read by the next request",
                        timeout
                    );
                }
                ResponseEnvelope::from_error(&request.command, &err)
            }
        };
        drop(session);

        match envelope.error() {
            Some(message) if !envelope.success() => error!("command failed: {}", message),
            _ => info!("command completed in {:?}ms", envelope.duration_ms()),
        }
        if let Some(text) = envelope.debug().filter(|d| !d.is_empty()) {
            debug!("helper debug info: {}", text);
        }

        Ok(envelope)
    }

    /// Run `body` against a started dispatcher and close it afterwards.
    ///
    /// The helper is closed whether `body` returns normally or panics; a
    /// panic is resumed once the helper is down. If the returned future is
    /// dropped before completion, the helper is killed when the last `Arc`
    /// goes away.
    pub async fn scoped<F, Fut, T>(config: SessionConfig, body: F) -> Result<T>
    where
        F: FnOnce(Arc<CommandDispatcher>) -> Fut,
        Fut: Future<Output = T>,
    {
        let dispatcher = Arc::new(CommandDispatcher::new(config));
        dispatcher.start().await?;

        let outcome = AssertUnwindSafe(body(Arc::clone(&dispatcher)))
            .catch_unwind()
            .await;
        dispatcher.close().await;

        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// One request/response cycle, bounded as a whole by `timeout`.
///
/// A helper that stops reading stdin can block the write once the pipe
/// buffer fills, so the write shares the deadline with the read.
async fn exchange(
    session: &mut ProcessSession,
    request: &CommandRequest,
    timeout: Duration,
) -> Result<ResponseEnvelope> {
    let deadline = Instant::now() + timeout;
    let line = request.to_line()?;

    match time::timeout_at(deadline, session.send_line(&line)).await {
        Ok(sent) => sent?,
        Err(_) => {
            warn!("request write did not complete within {:?}", timeout);
            return Err(GowershellError::Timeout(timeout));
        }
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    let response = session
        .recv_line(remaining)
        .await
        .map_err(|e| match e {
            GowershellError::Timeout(_) => GowershellError::Timeout(timeout),
            other => other,
        })?;
    ResponseEnvelope::from_line(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_from_config() {
        let dispatcher =
            CommandDispatcher::new(SessionConfig::default().default_timeout(Duration::from_secs(7)));
        assert_eq!(dispatcher.default_timeout(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_lazy_start_failure_propagates() {
        let dispatcher =
            CommandDispatcher::new(SessionConfig::new("./definitely-not-a-gowershell-helper"));

        let err = dispatcher
            .dispatch(&CommandRequest::new("dir"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GowershellError::Launch { .. }));
        assert_eq!(dispatcher.state().await, SessionState::NotStarted);
    }

    #[tokio::test]
    async fn test_scoped_launch_failure() {
        let result = CommandDispatcher::scoped(
            SessionConfig::new("./definitely-not-a-gowershell-helper"),
            |_shell| async { 1 },
        )
        .await;
        assert!(matches!(result, Err(GowershellError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_close_before_start() {
        let dispatcher = CommandDispatcher::new(SessionConfig::default());
        dispatcher.close().await;
        dispatcher.close().await;
        assert_eq!(dispatcher.state().await, SessionState::NotStarted);
        assert!(!dispatcher.is_healthy().await);
    }
}
