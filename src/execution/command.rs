//! Command requests and their wire encoding.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which interpreter the helper should run a command with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// The platform's generic shell (`cmd` on Windows).
    #[default]
    Cmd,
    /// PowerShell.
    #[serde(rename = "powershell")]
    PowerShell,
    /// A Unix shell running under WSL.
    Wsl,
}

impl CommandKind {
    /// The value sent in the request's `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Cmd => "cmd",
            CommandKind::PowerShell => "powershell",
            CommandKind::Wsl => "wsl",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cmd" => Ok(CommandKind::Cmd),
            "powershell" | "ps" => Ok(CommandKind::PowerShell),
            "wsl" => Ok(CommandKind::Wsl),
            other => Err(format!("unknown command type: {other}")),
        }
    }
}

/// A command to be executed by the helper.
///
/// Serializes to exactly the request line the helper expects:
///
/// ```
/// use gowershell_client::CommandRequest;
///
/// let line = serde_json::to_string(&CommandRequest::powershell("Get-Date")).unwrap();
/// assert_eq!(
///     line,
///     r#"{"command":"Get-Date","type":"powershell","headless":true,"persist_window":false,"verbose":false}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRequest {
    /// The command line to execute.
    pub command: String,
    /// Interpreter to run the command with.
    #[serde(rename = "type")]
    pub kind: CommandKind,
    /// Run without a visible window.
    pub headless: bool,
    /// Keep a visible window open after the command finishes.
    pub persist_window: bool,
    /// Ask the helper for debug output.
    pub verbose: bool,
    /// Response timeout for this request only. Never sent to the helper.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl CommandRequest {
    /// Create a headless `cmd` request.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            kind: CommandKind::Cmd,
            headless: true,
            persist_window: false,
            verbose: false,
            timeout: None,
        }
    }

    /// Create a headless `cmd` request.
    pub fn cmd(command: impl Into<String>) -> Self {
        Self::new(command)
    }

    /// Create a headless PowerShell request.
    pub fn powershell(command: impl Into<String>) -> Self {
        Self::new(command).kind(CommandKind::PowerShell)
    }

    /// Create a headless WSL request.
    pub fn wsl(command: impl Into<String>) -> Self {
        Self::new(command).kind(CommandKind::Wsl)
    }

    /// Create a request that runs in a visible window left open afterwards.
    pub fn shown(command: impl Into<String>, kind: CommandKind) -> Self {
        Self::new(command)
            .kind(kind)
            .headless(false)
            .persist_window(true)
    }

    /// Set the interpreter.
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set whether the command runs without a window.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set whether a visible window stays open after completion.
    pub fn persist_window(mut self, persist: bool) -> Self {
        self.persist_window = persist;
        self
    }

    /// Set whether the helper reports debug output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the response timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Encode the request as one protocol line, without the newline.
    pub fn to_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Human-readable window mode, used in logs.
    pub fn window_mode(&self) -> &'static str {
        match (self.headless, self.persist_window) {
            (true, _) => "headless",
            (false, true) => "headed (persistent)",
            (false, false) => "headed (auto-close)",
        }
    }
}

impl From<&str> for CommandRequest {
    fn from(command: &str) -> Self {
        Self::new(command)
    }
}

impl From<String> for CommandRequest {
    fn from(command: String) -> Self {
        Self::new(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_request_defaults() {
        let req = CommandRequest::new("dir");
        assert_eq!(req.command, "dir");
        assert_eq!(req.kind, CommandKind::Cmd);
        assert!(req.headless);
        assert!(!req.persist_window);
        assert!(!req.verbose);
        assert!(req.timeout.is_none());
    }

    #[test]
    fn test_wire_shape() {
        let req = CommandRequest::wsl("ls -la")
            .headless(false)
            .persist_window(true)
            .verbose(true)
            .timeout(Duration::from_secs(5));

        let value: Value = serde_json::from_str(&req.to_line().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "command": "ls -la",
                "type": "wsl",
                "headless": false,
                "persist_window": true,
                "verbose": true,
            })
        );
    }

    #[test]
    fn test_line_has_no_newline() {
        let line = CommandRequest::new("echo a\nb").to_line().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("echo a\\nb"));
    }

    #[test]
    fn test_presets() {
        assert_eq!(CommandRequest::cmd("x").kind, CommandKind::Cmd);
        assert_eq!(CommandRequest::powershell("x").kind, CommandKind::PowerShell);
        assert_eq!(CommandRequest::wsl("x").kind, CommandKind::Wsl);

        let shown = CommandRequest::shown("az login", CommandKind::Cmd);
        assert!(!shown.headless);
        assert!(shown.persist_window);
    }

    #[test]
    fn test_window_mode() {
        assert_eq!(CommandRequest::new("x").window_mode(), "headless");
        assert_eq!(
            CommandRequest::new("x").headless(false).window_mode(),
            "headed (auto-close)"
        );
        assert_eq!(
            CommandRequest::shown("x", CommandKind::Cmd).window_mode(),
            "headed (persistent)"
        );
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("cmd".parse::<CommandKind>(), Ok(CommandKind::Cmd));
        assert_eq!("PowerShell".parse::<CommandKind>(), Ok(CommandKind::PowerShell));
        assert_eq!("ps".parse::<CommandKind>(), Ok(CommandKind::PowerShell));
        assert_eq!("wsl".parse::<CommandKind>(), Ok(CommandKind::Wsl));
        assert!("bash".parse::<CommandKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in [CommandKind::Cmd, CommandKind::PowerShell, CommandKind::Wsl] {
            let encoded = serde_json::to_value(kind).unwrap();
            assert_eq!(encoded, Value::String(kind.to_string()));
        }
    }

    #[test]
    fn test_from_str_conversions() {
        let a: CommandRequest = "echo a".into();
        let b: CommandRequest = String::from("echo b").into();
        assert_eq!(a.command, "echo a");
        assert_eq!(b.command, "echo b");
    }
}
