//! Configuration management for gowershell-client.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::session::{default_executable, SessionConfig, DEFAULT_GRACE_PERIOD, DEFAULT_TIMEOUT};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Helper process configuration.
    pub helper: HelperSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Helper process configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperSection {
    /// Path of the helper executable.
    pub executable: PathBuf,
    /// Extra arguments for the helper.
    pub args: Vec<String>,
    /// Environment variables for the helper.
    pub env: HashMap<String, String>,
    /// Working directory for the helper.
    pub working_dir: Option<PathBuf>,
    /// Response timeout in seconds.
    pub timeout_secs: u64,
    /// Grace period before a forced kill, in milliseconds.
    pub grace_period_ms: u64,
}

impl Default for HelperSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            grace_period_ms: DEFAULT_GRACE_PERIOD.as_millis() as u64,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(exe) = lookup("GOWERSHELL_EXE").filter(|v| !v.is_empty()) {
            self.helper.executable = PathBuf::from(exe);
        }

        if let Some(timeout) = lookup("GOWERSHELL_TIMEOUT") {
            if let Ok(secs) = timeout.trim().parse() {
                self.helper.timeout_secs = secs;
            }
        }

        if let Some(level) = lookup("GOWERSHELL_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref exe) = args.executable {
            self.helper.executable = exe.clone();
        }

        if let Some(secs) = args.timeout_secs {
            self.helper.timeout_secs = secs;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        } else if args.verbose && self.logging.level == LoggingSection::default().level {
            self.logging.level = "debug".to_string();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to a [`SessionConfig`] for the dispatcher.
    pub fn to_session_config(&self) -> Result<SessionConfig, ConfigError> {
        if self.helper.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_secs",
                "must be greater than zero".to_string(),
            ));
        }
        if self.helper.executable.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "executable",
                "must not be empty".to_string(),
            ));
        }

        let mut session = SessionConfig::new(&self.helper.executable)
            .args(self.helper.args.iter().cloned())
            .grace_period(Duration::from_millis(self.helper.grace_period_ms))
            .default_timeout(Duration::from_secs(self.helper.timeout_secs));

        for (key, value) in &self.helper.env {
            session = session.env(key, value);
        }
        if let Some(ref dir) = self.helper.working_dir {
            session = session.working_dir(dir);
        }

        Ok(session)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A value is out of range.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, reason) => write!(f, "invalid {}: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}
