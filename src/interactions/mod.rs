//! Interaction pipeline: discovery, filtering, gating, and reply dispatch.
//!
//! One cycle:
//! 1. `discovery`: mention search plus per-priority-author search
//! 2. `filter`: priority quota, self exclusion, de-duplication
//! 3. `selection`: deterministic order and watermark checks
//! 4. `gate`: should-respond classification, then reply generation
//! 5. `dispatch`: split, send as a reply chain, record memory
//!
//! `scheduler` drives cycles on a fixed interval.

mod discovery;
mod dispatch;
mod filter;
mod gate;
mod scheduler;
mod selection;


use murmur_core::{
    config::{InteractionsConfig, Persona, Templates},
    error::MurmurError,
    memory::{agent_id, memory_id, DispatchOutcome},
    post::{Post, Profile, Watermark},
    traits::{Generator, InteractionStore, PlatformClient},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dispatch::DispatchResult;
use gate::GateOutcome;

/// State carried from one cycle to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// Largest post id fully handled. Never decreases.
    pub last_processed_id: Option<Watermark>,
    /// Priority handles already granted an interaction this cycle.
    pub daily_quota_used: HashSet<String>,
}

impl InteractionState {
    /// Raise the watermark to `id` if `id` is newer.
    pub fn advance(&mut self, id: &Watermark) {
        let newer = match &self.last_processed_id {
            Some(current) => current.is_behind(id),
            None => true,
        };
        if newer {
            self.last_processed_id = Some(id.clone());
        }
    }
}

/// Failures inside a cycle, by pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    /// Mention search or profile lookup failed.
    #[error("discovery failed: {0}")]
    Discovery(MurmurError),

    /// A generation call returned an error.
    #[error("generation failed: {0}")]
    Generation(MurmurError),

    /// A generation call did not answer in time.
    #[error("generation timed out after {0}s")]
    Timeout(u64),

    /// Sending a reply failed.
    #[error("dispatch failed: {0}")]
    Dispatch(MurmurError),

    /// Reading or writing the watermark or memory failed.
    #[error("persistence failed: {0}")]
    Persistence(MurmurError),
}

/// What one cycle did, for logs and `murmur once`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Posts returned by both discovery sources.
    pub discovered: usize,
    /// Candidates left after quota, de-duplication, and self exclusion.
    pub candidates: usize,
    /// Candidates not newer than the watermark.
    pub skipped_watermark: usize,
    /// Candidates already answered (in dry-run mode, also already logged).
    pub skipped_memory: usize,
    /// Candidates that went through the gate.
    pub processed: usize,
    pub responded: usize,
    pub ignored: usize,
    pub stopped: usize,
    /// RESPOND decisions whose generated text was empty.
    pub empty: usize,
    /// Generation errors and timeouts.
    pub generation_failures: usize,
    /// Posts published (or logged, in dry-run mode).
    pub sent_posts: usize,
    pub dispatch_failures: usize,
    /// Memory records not written after a send; those posts may be answered again.
    pub memory_write_failures: usize,
    pub watermark: Option<Watermark>,
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "discovered={} candidates={} processed={} responded={} ignored={} stopped={} \
             empty={} sent_posts={} skipped(watermark={}, memory={}) failures(generation={}, dispatch={}, memory_write={}) \
             watermark={}",
            self.discovered,
            self.candidates,
            self.processed,
            self.responded,
            self.ignored,
            self.stopped,
            self.empty,
            self.sent_posts,
            self.skipped_watermark,
            self.skipped_memory,
            self.generation_failures,
            self.dispatch_failures,
            self.memory_write_failures,
            self.watermark
                .as_ref()
                .map(|w| w.to_string())
                .unwrap_or_else(|| "none".into()),
        )
    }
}

/// The interaction pipeline for one agent account.
pub struct Interactions {
    pub(crate) platform: Arc<dyn PlatformClient>,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) store: Arc<dyn InteractionStore>,
    pub(crate) config: InteractionsConfig,
    pub(crate) persona: Persona,
    pub(crate) templates: Templates,
    /// How many past exchanges with an author go into the prompt.
    pub(crate) history_limit: usize,
    /// Log replies instead of sending them.
    pub(crate) dry_run: bool,
}

impl Interactions {
    /// Create a new pipeline.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn InteractionStore>,
        config: InteractionsConfig,
        persona: Persona,
        templates: Templates,
        history_limit: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            platform,
            generator,
            store,
            config,
            persona,
            templates,
            history_limit,
            dry_run,
        }
    }

    /// Load the persisted watermark for the authenticated account.
    pub async fn load_state(&self) -> Result<InteractionState, InteractionError> {
        let profile = self
            .platform
            .profile()
            .await
            .map_err(InteractionError::Discovery)?;
        let agent = agent_id(&profile.id);
        let last_processed_id = self
            .store
            .get_watermark(&agent)
            .await
            .map_err(InteractionError::Persistence)?;

        info!(
            "interactions: loaded state for @{} (watermark: {})",
            profile.handle,
            last_processed_id
                .as_ref()
                .map(|w| w.as_str())
                .unwrap_or("none")
        );
        Ok(InteractionState {
            last_processed_id,
            daily_quota_used: HashSet::new(),
        })
    }

    /// Run one full cycle. `now` is the current time in seconds since the epoch.
    ///
    /// The state is always handed back, including the watermark progress
    /// made before a failure.
    pub async fn run_cycle(
        &self,
        mut state: InteractionState,
        now: i64,
    ) -> (InteractionState, Result<CycleReport, InteractionError>) {
        let started = Instant::now();
        state.daily_quota_used.clear();

        let profile = match self.platform.profile().await {
            Ok(p) => p,
            Err(e) => {
                let err = InteractionError::Discovery(e);
                warn!("interactions: cycle failed: {err}");
                return (state, Err(err));
            }
        };
        let agent = agent_id(&profile.id);

        let mut report = CycleReport::default();
        let processed = self
            .process(&mut state, &profile, &agent, now, &mut report)
            .await;

        // Persisted even when the cycle stopped early, so progress is kept.
        let saved = match &state.last_processed_id {
            Some(w) => self
                .store
                .set_watermark(&agent, w)
                .await
                .map_err(InteractionError::Persistence),
            None => Ok(()),
        };

        let result = match (processed, saved) {
            (Ok(()), Ok(())) => {
                report.watermark = state.last_processed_id.clone();
                Ok(report)
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(save_err)) => {
                error!("interactions: failed to persist watermark: {save_err}");
                Err(e)
            }
        };

        match &result {
            Ok(report) => info!(
                "interactions: cycle done in {}ms | {report}",
                started.elapsed().as_millis()
            ),
            Err(InteractionError::Persistence(e)) => {
                error!("interactions: persistence failure, cycle aborted: {e}")
            }
            Err(e) => warn!("interactions: cycle failed: {e}"),
        }
        (state, result)
    }

    /// Discovery through dispatch for every candidate of this cycle.
    async fn process(
        &self,
        state: &mut InteractionState,
        profile: &Profile,
        agent: &Uuid,
        now: i64,
        report: &mut CycleReport,
    ) -> Result<(), InteractionError> {
        let priority = self.config.priority_handles();
        let discovered = discovery::discover(
            self.platform.as_ref(),
            &profile.handle,
            &priority,
            self.config.mention_limit,
            self.config.author_limit,
        )
        .await?;
        report.discovered = discovered.len();

        let picks = filter::select_priority(
            discovered.by_author,
            state,
            now,
            self.config.recency_window_hours,
            &mut rand::thread_rng(),
        );
        let combined = filter::combine(discovered.mentions, picks, &profile.id);
        let candidates = selection::order(combined, self.config.candidate_order);
        report.candidates = candidates.len();

        for post in &candidates {
            if !selection::is_due(post, state.last_processed_id.as_ref()) {
                debug!("interactions: {} not newer than watermark, skipping", post.id);
                report.skipped_watermark += 1;
                continue;
            }

            let existing = self
                .store
                .get_memory(&memory_id(&post.id, agent))
                .await
                .map_err(InteractionError::Persistence)?;
            if existing.is_some() {
                debug!("interactions: already answered {}, skipping", post.id);
                report.skipped_memory += 1;
                continue;
            }

            // Dry runs write no memory; the audit log stands in for it.
            if self.dry_run
                && self
                    .store
                    .has_dispatch(agent, &post.id, DispatchOutcome::DryRun)
                    .await
                    .map_err(InteractionError::Persistence)?
            {
                debug!("interactions: {} already answered in dry-run, skipping", post.id);
                report.skipped_memory += 1;
                continue;
            }

            info!("interactions: processing {}", post.permanent_url);
            report.processed += 1;
            self.handle_candidate(post, profile, agent, report).await;

            match post.id.numeric() {
                Some(id) => state.advance(&id),
                None => warn!(
                    "interactions: non-numeric post id {}, watermark unchanged",
                    post.id
                ),
            }
        }

        Ok(())
    }

    /// Gate and, on RESPOND, dispatch one candidate. Failures stay local.
    async fn handle_candidate(
        &self,
        post: &Post,
        profile: &Profile,
        agent: &Uuid,
        report: &mut CycleReport,
    ) {
        match self.evaluate(post, profile, agent).await {
            Ok(GateOutcome::Skipped) => {}
            Ok(GateOutcome::Ignored) => report.ignored += 1,
            Ok(GateOutcome::Stopped) => report.stopped += 1,
            Ok(GateOutcome::Empty) => {
                report.responded += 1;
                report.empty += 1;
            }
            Ok(GateOutcome::Reply(content)) => {
                report.responded += 1;
                let DispatchResult {
                    sent,
                    failed,
                    unrecorded,
                } = self.dispatch(post, profile, agent, &content.text).await;
                report.sent_posts += sent;
                report.memory_write_failures += unrecorded;
                if failed {
                    report.dispatch_failures += 1;
                }
            }
            Err(e) => {
                warn!("interactions: {} not answered: {e}", post.id);
                report.generation_failures += 1;
            }
        }
    }
}
