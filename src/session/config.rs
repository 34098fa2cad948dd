//! Helper process configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// How long `close` waits for the helper to exit before killing it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default response timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Get the default helper executable path for the current platform.
pub fn default_executable() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from("./gowershell.exe")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("./gowershell")
    }
}

/// Configuration for spawning a helper session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path of the helper executable.
    pub executable: PathBuf,
    /// Extra arguments passed to the helper.
    pub args: Vec<String>,
    /// Environment variables to set for the helper.
    pub env: HashMap<String, String>,
    /// Working directory override (if any).
    pub working_dir: Option<PathBuf>,
    /// Grace period between the termination request and a forced kill.
    pub grace_period: Duration,
    /// Timeout used when a request does not carry its own.
    pub default_timeout: Duration,
}

impl SessionConfig {
    /// Create a configuration for the given helper executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            grace_period: DEFAULT_GRACE_PERIOD,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the shutdown grace period.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Set the default request timeout.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(default_executable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.executable, default_executable());
        assert!(config.args.is_empty());
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert_eq!(config.default_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_default_executable_is_relative() {
        let exe = default_executable();
        assert!(exe.is_relative());
        assert!(exe.to_string_lossy().contains("gowershell"));
    }

    #[test]
    fn test_builder_chain() {
        let config = SessionConfig::new("/bin/sh")
            .arg("-c")
            .args(["cat", "--"])
            .env("LANG", "C")
            .working_dir("/tmp")
            .grace_period(Duration::from_millis(100))
            .default_timeout(Duration::from_secs(2));

        assert_eq!(config.executable, PathBuf::from("/bin/sh"));
        assert_eq!(config.args, vec!["-c", "cat", "--"]);
        assert_eq!(config.env.get("LANG"), Some(&"C".to_string()));
        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(config.grace_period, Duration::from_millis(100));
        assert_eq!(config.default_timeout, Duration::from_secs(2));
    }
}
