//! Helper process sessions.
//!
//! This module owns the helper process: how it is launched, how its pipes
//! are read and written, and how it is shut down.

mod config;
mod pipes;
mod process;
mod state;

pub use config::{default_executable, SessionConfig, DEFAULT_GRACE_PERIOD, DEFAULT_TIMEOUT};
pub use process::ProcessSession;
pub use state::SessionState;
