//! Request dispatch to the helper.
//!
//! This module provides the client side of the protocol:
//! - Request construction and encoding
//! - Response decoding with embedded JSON extraction
//! - Serialized dispatch with per-request timeouts
//! - Batches, sequential or concurrent
//!
//! # Example
//!
//! ```no_run
//! use gowershell_client::execution::{CommandDispatcher, CommandRequest};
//! use gowershell_client::SessionConfig;
//!
//! # async fn run() -> gowershell_client::Result<()> {
//! let shell = CommandDispatcher::new(SessionConfig::default());
//!
//! let result = shell.execute(&CommandRequest::powershell("Get-Date")).await?;
//! println!("Output: {:?}", result.output());
//!
//! shell.close().await;
//! # Ok(())
//! # }
//! ```

mod batch;
mod command;
mod dispatcher;
mod result;

pub use crate::session::DEFAULT_TIMEOUT;
pub use command::{CommandKind, CommandRequest};
pub use dispatcher::CommandDispatcher;
pub use result::ResponseEnvelope;
