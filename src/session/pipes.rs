//! Background tasks for the helper's output pipes.
//!
//! The stdout reader turns the byte stream into complete lines and hands
//! them to whoever holds the receiving end, decoupling "a line arrived"
//! from "a dispatch is waiting for it". The stderr drain keeps the helper
//! from blocking on a full pipe.

use std::borrow::Cow;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Capacity of the response line channel.
pub(crate) const LINE_CHANNEL_CAPACITY: usize = 64;

/// Forward every non-blank line of `reader` into `tx`.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the
/// stream, so one bad line cannot take the session down. Returns when the
/// stream reaches EOF, the receiver is dropped, or a read fails. Dropping
/// `tx` on return is what signals EOF to the receiver.
pub(crate) fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!("stdout reader: EOF");
                    break;
                }
                Ok(_) => {
                    let decoded = String::from_utf8_lossy(&buf);
                    if let Cow::Owned(_) = decoded {
                        warn!("helper stdout line is not valid UTF-8");
                    }
                    let line = decoded.trim_end_matches(|c: char| c == '\n' || c == '\r');
                    if line.trim().is_empty() {
                        continue;
                    }
                    trace!("helper stdout: {}", line);
                    if tx.send(line.to_string()).await.is_err() {
                        debug!("stdout reader: channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!("stdout reader error: {}", e);
                    break;
                }
            }
        }
    })
}

/// Log each line the helper writes to stderr.
pub(crate) fn spawn_stderr_drain<R>(reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("helper stderr: {}", line);
        }
    })
}
