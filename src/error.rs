//! Error types for gowershell-client.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for gowershell-client operations.
///
/// Only [`GowershellError::Launch`] and misuse such as
/// [`GowershellError::SessionClosed`] ever reach callers of
/// [`CommandDispatcher::dispatch`](crate::CommandDispatcher::dispatch); the
/// remaining variants are folded into error-bearing envelopes.
#[derive(Error, Debug)]
pub enum GowershellError {
    /// The helper executable could not be spawned.
    #[error("failed to launch helper {}: {source}", executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: crate::session::SessionState,
        to: crate::session::SessionState,
    },

    /// An operation needed a live helper process but none was running.
    #[error("helper process is not running")]
    NotRunning,

    /// The session was closed and will not be restarted implicitly.
    #[error("session is closed")]
    SessionClosed,

    /// A piped standard stream was missing from the spawned child.
    #[error("helper {0} pipe unavailable")]
    MissingPipe(&'static str),

    /// No response line arrived before the deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Writing a request to the helper's stdin failed.
    #[error("failed to write request: {0}")]
    Write(#[source] std::io::Error),

    /// The helper closed its stdout, usually because it exited.
    #[error("helper process closed its output stream")]
    OutputClosed,

    /// A response line did not have the expected shape.
    #[error("invalid response: {0}")]
    Protocol(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for gowershell-client operations.
pub type Result<T> = std::result::Result<T, GowershellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_display() {
        let err = GowershellError::Launch {
            executable: PathBuf::from("./gowershell.exe"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("./gowershell.exe"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_write_error_keeps_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = GowershellError::Write(io_err);
        assert!(err.to_string().contains("pipe closed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GowershellError = json_err.into();
        assert!(matches!(err, GowershellError::Json(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = GowershellError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_missing_pipe_display() {
        let err = GowershellError::MissingPipe("stdout");
        assert_eq!(err.to_string(), "helper stdout pipe unavailable");
    }
}
