//! Reply dispatch: split, send as a chain, remember, audit.

use super::{InteractionError, Interactions};
use chrono::{DateTime, Utc};
use murmur_core::{
    memory::{memory_id, room_id, DispatchEntry, DispatchOutcome, MemoryKind, MemoryRecord},
    post::{Post, Profile},
};
use murmur_platform::split_post;
use rand::Rng;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DispatchResult {
    /// Posts sent, or logged in dry-run mode.
    pub sent: usize,
    /// A send failed and cut the chain short.
    pub failed: bool,
    /// Memory records lost after a successful send.
    pub unrecorded: usize,
}

impl Interactions {
    /// Send `text` as a reply chain under `source`.
    ///
    /// The first chunk replies to `source`, each later chunk to the previous
    /// sent post. A failed send stops the chain; whatever was sent is still
    /// recorded so the source is never answered twice.
    pub(crate) async fn dispatch(
        &self,
        source: &Post,
        profile: &Profile,
        agent: &Uuid,
        text: &str,
    ) -> DispatchResult {
        let chunks = split_post(text, self.config.max_post_length);

        if self.dry_run {
            for (i, chunk) in chunks.iter().enumerate() {
                info!(
                    "interactions: [dry-run] reply {}/{} to {}: {chunk}",
                    i + 1,
                    chunks.len(),
                    source.permanent_url
                );
            }
            self.audit(agent, source, DispatchOutcome::DryRun, chunks.len(), None)
                .await;
            return DispatchResult {
                sent: chunks.len(),
                ..Default::default()
            };
        }

        let mut sent: Vec<Post> = Vec::with_capacity(chunks.len());
        let mut failure = None;
        let mut parent = source.id.clone();

        for chunk in &chunks {
            match self.platform.send_post(chunk, Some(&parent)).await {
                Ok(post) => {
                    info!("interactions: replied to @{} with {}", source.author_handle, post.id);
                    parent = post.id.clone();
                    sent.push(post);
                    self.pause().await;
                }
                Err(e) => {
                    let err = InteractionError::Dispatch(e);
                    warn!("interactions: reply to {} failed: {err}", source.id);
                    failure = Some(err.to_string());
                    break;
                }
            }
        }

        let unrecorded = if sent.is_empty() {
            0
        } else {
            self.remember(source, profile, agent, &sent).await
        };

        let outcome = if failure.is_some() {
            DispatchOutcome::Failed
        } else {
            DispatchOutcome::Sent
        };
        self.audit(agent, source, outcome, sent.len(), failure.clone())
            .await;

        DispatchResult {
            sent: sent.len(),
            failed: failure.is_some(),
            unrecorded,
        }
    }

    /// Record the answered source post and every sent reply.
    ///
    /// Returns how many records could not be written.
    async fn remember(
        &self,
        source: &Post,
        profile: &Profile,
        agent: &Uuid,
        sent: &[Post],
    ) -> usize {
        let room = room_id(&source.conversation_id, agent);
        let source_key = memory_id(&source.id, agent);

        let mut records = Vec::with_capacity(sent.len() + 1);
        records.push(MemoryRecord {
            id: source_key,
            agent_id: *agent,
            room_id: room,
            kind: MemoryKind::Answered,
            post_id: source.id.clone(),
            author_handle: source.author_handle.clone(),
            counterpart: source.author_handle.clone(),
            content: source.text.clone(),
            url: Some(source.permanent_url.clone()),
            in_reply_to: source.in_reply_to_id.as_ref().map(|p| memory_id(p, agent)),
            created_at: DateTime::<Utc>::from_timestamp(source.timestamp, 0)
                .unwrap_or_else(Utc::now),
        });

        let mut parent_key = source_key;
        for post in sent {
            let key = memory_id(&post.id, agent);
            records.push(MemoryRecord {
                id: key,
                agent_id: *agent,
                room_id: room,
                kind: MemoryKind::Reply,
                post_id: post.id.clone(),
                author_handle: profile.handle.clone(),
                counterpart: source.author_handle.clone(),
                content: post.text.clone(),
                url: Some(post.permanent_url.clone()),
                in_reply_to: Some(parent_key),
                created_at: Utc::now(),
            });
            parent_key = key;
        }

        let mut failures = 0;
        for record in &records {
            if let Err(e) = self.store.put_memory(record).await {
                let err = InteractionError::Persistence(e);
                error!("interactions: failed to record {}: {err}", record.post_id);
                failures += 1;
            }
        }
        failures
    }

    async fn audit(
        &self,
        agent: &Uuid,
        source: &Post,
        outcome: DispatchOutcome,
        sent_posts: usize,
        detail: Option<String>,
    ) {
        let entry = DispatchEntry {
            agent_id: *agent,
            post_id: source.id.clone(),
            author_handle: source.author_handle.clone(),
            outcome,
            sent_posts,
            detail,
        };
        if let Err(e) = self.store.log_dispatch(&entry).await {
            warn!("interactions: audit write failed: {e}");
        }
    }

    /// Randomized wait after a send.
    async fn pause(&self) {
        let (min, max) = (self.config.reply_delay_min_ms, self.config.reply_delay_max_ms);
        let ms = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
