//! Command-line interface for gowershell-client.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::execution::{CommandKind, CommandRequest};

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Helper executable (overrides config file).
    pub executable: Option<PathBuf>,
    /// Interpreter for every command.
    pub shell: CommandKind,
    /// Per-command timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Run commands in a visible window.
    pub headed: bool,
    /// Keep visible windows open after completion.
    pub persist: bool,
    /// Ask the helper for debug output.
    pub verbose: bool,
    /// Submit all commands at once.
    pub concurrent: bool,
    /// Print each response envelope as a JSON line.
    pub json: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Commands to run, in order.
    pub commands: Vec<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

impl Args {
    /// Build one request per command from the parsed flags.
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.commands
            .iter()
            .map(|command| {
                CommandRequest::new(command.as_str())
                    .kind(self.shell)
                    .headless(!self.headed && !self.persist)
                    .persist_window(self.persist)
                    .verbose(self.verbose)
            })
            .collect()
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('e') | Long("executable") => {
                result.executable = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("shell") => {
                let value: String = parser.value()?.parse()?;
                result.shell = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("shell", value))?;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout_secs = match value.parse() {
                    Ok(0) | Err(_) => return Err(ArgsError::InvalidValue("timeout", value)),
                    Ok(secs) => Some(secs),
                };
            }
            Long("headed") => {
                result.headed = true;
            }
            Long("persist") => {
                result.persist = true;
            }
            Short('v') | Long("verbose") => {
                result.verbose = true;
            }
            Long("concurrent") => {
                result.concurrent = true;
            }
            Long("json") => {
                result.json = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result.commands.push(
                    val.into_string()
                        .map_err(|v| ArgsError::UnexpectedArgument(v.to_string_lossy().into()))?,
                );
                for rest in parser.raw_args()? {
                    result.commands.push(
                        rest.into_string().map_err(|v| {
                            ArgsError::UnexpectedArgument(v.to_string_lossy().into())
                        })?,
                    );
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if result.commands.is_empty() && !result.help && !result.version {
        return Err(ArgsError::MissingCommand);
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"gowershell-client {version}
Run shell commands through the gowershell helper

USAGE:
    gowershell-client [OPTIONS] <COMMAND>...

OPTIONS:
    -e, --executable <PATH> Helper executable [default: ./gowershell]
    -s, --shell <TYPE>      Interpreter: cmd, powershell (ps), wsl [default: cmd]
    -t, --timeout <SECS>    Per-command timeout in seconds [default: 30]
        --headed            Run commands in a visible window
        --persist           Keep the window open after the command finishes
    -v, --verbose           Ask the helper for debug output
        --concurrent        Submit all commands at once
        --json              Print one JSON result per line
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    GOWERSHELL_EXE          Helper executable (overrides config)
    GOWERSHELL_TIMEOUT      Timeout in seconds (overrides config)
    GOWERSHELL_LOG_LEVEL    Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT STATUS:
    0    every command succeeded
    1    at least one command failed
    2    usage or configuration error
    130  interrupted

EXAMPLES:
    # Run two cmd commands, one after the other
    gowershell-client dir ver

    # PowerShell with JSON results
    gowershell-client -s ps --json "Get-Date | ConvertTo-Json"

    # Interactive login in a window that stays open
    gowershell-client --persist "az login"
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("gowershell-client {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Argument that is not valid UTF-8.
    UnexpectedArgument(String),
    /// No command was given.
    MissingCommand,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
            Self::MissingCommand => write!(f, "no command given"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("gowershell-client")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&["dir"])).unwrap();
        assert_eq!(result.commands, vec!["dir"]);
        assert_eq!(result.shell, CommandKind::Cmd);
        assert!(result.executable.is_none());
        assert!(result.timeout_secs.is_none());
        assert!(!result.concurrent);
        assert!(!result.json);
    }

    #[test]
    fn test_missing_command() {
        let result = parse_args_from(args(&["-s", "ps"]));
        assert!(matches!(result, Err(ArgsError::MissingCommand)));
    }

    #[test]
    fn test_shell_option() {
        let result = parse_args_from(args(&["-s", "ps", "Get-Date"])).unwrap();
        assert_eq!(result.shell, CommandKind::PowerShell);

        let result = parse_args_from(args(&["--shell", "wsl", "ls"])).unwrap();
        assert_eq!(result.shell, CommandKind::Wsl);
    }

    #[test]
    fn test_invalid_shell() {
        let result = parse_args_from(args(&["-s", "bash", "ls"]));
        assert!(matches!(result, Err(ArgsError::InvalidValue("shell", _))));
    }

    #[test]
    fn test_timeout() {
        let result = parse_args_from(args(&["-t", "5", "dir"])).unwrap();
        assert_eq!(result.timeout_secs, Some(5));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(parse_args_from(args(&["-t", "soon", "dir"])).is_err());
        assert!(parse_args_from(args(&["-t", "0", "dir"])).is_err());
    }

    #[test]
    fn test_commands_after_first_are_literal() {
        let result = parse_args_from(args(&["--json", "dir", "-v", "echo hi"])).unwrap();
        assert!(result.json);
        assert!(!result.verbose);
        assert_eq!(result.commands, vec!["dir", "-v", "echo hi"]);
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_requests_default_headless() {
        let result = parse_args_from(args(&["-v", "dir", "ver"])).unwrap();
        let requests = result.requests();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].command, "ver");
        assert!(requests.iter().all(|r| r.headless && r.verbose));
    }

    #[test]
    fn test_requests_window_flags() {
        let headed = parse_args_from(args(&["--headed", "notepad"])).unwrap();
        let request = &headed.requests()[0];
        assert!(!request.headless);
        assert!(!request.persist_window);

        let persist = parse_args_from(args(&["--persist", "az login"])).unwrap();
        let request = &persist.requests()[0];
        assert!(!request.headless);
        assert!(request.persist_window);
    }

    #[test]
    fn test_combined_options() {
        let result = parse_args_from(args(&[
            "-e",
            "/opt/gowershell",
            "-c",
            "/etc/gowershell.json",
            "-l",
            "debug",
            "--concurrent",
            "dir",
        ]))
        .unwrap();

        assert_eq!(result.executable, Some(PathBuf::from("/opt/gowershell")));
        assert_eq!(result.config, Some(PathBuf::from("/etc/gowershell.json")));
        assert_eq!(result.log_level, Some("debug".to_string()));
        assert!(result.concurrent);
    }
}
