//! Running several requests against one dispatcher.

use futures_util::future::join_all;
use tracing::info;

use super::command::CommandRequest;
use super::dispatcher::CommandDispatcher;
use super::result::ResponseEnvelope;
use crate::Result;

impl CommandDispatcher {
    /// Run every request and return one envelope per request, in input
    /// order.
    ///
    /// With `concurrent` set the requests are issued together, but the
    /// session gate still serializes them on the wire, so the only
    /// difference from sequential mode is that callers do not wait between
    /// submissions. A failing request does not stop the batch. An empty
    /// batch returns immediately without touching the helper.
    pub async fn run_batch(
        &self,
        requests: &[CommandRequest],
        concurrent: bool,
    ) -> Result<Vec<ResponseEnvelope>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "running batch of {} command(s) ({})",
            requests.len(),
            if concurrent { "concurrent" } else { "sequential" }
        );

        if concurrent {
            join_all(requests.iter().map(|request| self.execute(request)))
                .await
                .into_iter()
                .collect()
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.execute(request).await?);
            }
            Ok(results)
        }
    }
}
