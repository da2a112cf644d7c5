//! Poll loop: one cycle, then a fixed wait, until cancelled.

use super::{InteractionState, Interactions};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

impl Interactions {
    /// Run cycles until `cancel` fires.
    ///
    /// The wait is measured from the end of one cycle to the start of the
    /// next, so cycles never overlap. A failed cycle is logged and the loop
    /// carries on. Cancellation is honored between cycles and during the
    /// wait; a running cycle finishes first.
    pub async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        info!(
            "interactions: polling every {}s | generator: {} | platform: {}{}",
            interval.as_secs(),
            self.generator.name(),
            self.platform.name(),
            if self.dry_run { " | dry-run" } else { "" }
        );

        let mut state: Option<InteractionState> = None;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Loading retries every cycle until the account and store answer.
            if state.is_none() {
                match self.load_state().await {
                    Ok(s) => state = Some(s),
                    Err(e) => error!("interactions: failed to load state: {e}"),
                }
            }

            if let Some(current) = state.take() {
                let now = chrono::Utc::now().timestamp();
                let (next, _) = self.run_cycle(current, now).await;
                state = Some(next);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("interactions: loop stopped");
    }
}
