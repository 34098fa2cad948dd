//! # gowershell-client
//!
//! Client library for the gowershell helper process.
//!
//! The helper is a long-lived executable that runs shell commands on the
//! client's behalf. This crate launches it, sends it one JSON request per
//! line on stdin and reads one JSON response per line from its stdout.
//!
//! ## Features
//!
//! - **Serialized dispatch**: one request in flight per helper, in arrival order
//! - **Timeouts**: per-request deadlines reported as error envelopes
//! - **Blob extraction**: JSON objects embedded in command output are parsed out
//! - **Batches**: run many commands against one helper, sequentially or concurrently
//! - **Scoped sessions**: the helper is closed however the caller's work ends
//!
//! ## Quick Start
//!
//! ```no_run
//! use gowershell_client::{CommandDispatcher, CommandRequest, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> gowershell_client::Result<()> {
//!     // Initialize logging
//!     gowershell_client::logging::try_init().ok();
//!
//!     let results = CommandDispatcher::scoped(SessionConfig::default(), |shell| async move {
//!         let requests = vec![
//!             CommandRequest::cmd("ver"),
//!             CommandRequest::powershell("Get-Process | ConvertTo-Json -Compress"),
//!         ];
//!         shell.run_batch(&requests, false).await
//!     })
//!     .await??;
//!
//!     for result in &results {
//!         println!("{:?} ({} blobs)", result.output(), result.blobs().len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod session;

// Re-export commonly used types
pub use error::{GowershellError, Result};
pub use execution::{CommandDispatcher, CommandKind, CommandRequest, ResponseEnvelope};
pub use output::extract_json_blobs;
pub use session::{ProcessSession, SessionConfig, SessionState};
