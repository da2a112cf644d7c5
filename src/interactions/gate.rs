//! Response gate: classify first, generate only on RESPOND.

use super::{InteractionError, Interactions};
use murmur_core::{
    error::MurmurError,
    post::{Post, Profile},
    prompt::PromptState,
    traits::GeneratedContent,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of the should-respond classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Respond,
    Ignore,
    Stop,
}

impl Decision {
    /// Strict parse of a classification answer.
    ///
    /// Surrounding whitespace and one pair of square brackets are tolerated;
    /// anything other than exactly `RESPOND`, `IGNORE` or `STOP` is `Ignore`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let label = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed);
        match label {
            "RESPOND" => Self::Respond,
            "STOP" => Self::Stop,
            _ => Self::Ignore,
        }
    }
}

/// What the gate did with one candidate.
#[derive(Debug)]
pub(crate) enum GateOutcome {
    /// The post had no text; nothing was asked.
    Skipped,
    Ignored,
    Stopped,
    /// RESPOND, but the generated text was empty.
    Empty,
    Reply(GeneratedContent),
}

impl Interactions {
    /// Compose state for `post`, classify it, and generate a reply on RESPOND.
    pub(crate) async fn evaluate(
        &self,
        post: &Post,
        profile: &Profile,
        agent: &Uuid,
    ) -> Result<GateOutcome, InteractionError> {
        if post.text.trim().is_empty() {
            debug!("interactions: {} has no text, skipping", post.id);
            return Ok(GateOutcome::Skipped);
        }

        let thread = self.build_thread(post).await;
        let history = match self
            .store
            .recent_memories_for(agent, &post.author_handle, self.history_limit)
            .await
        {
            Ok(h) => h,
            Err(e) => {
                warn!("interactions: history for @{} unavailable: {e}", post.author_handle);
                Vec::new()
            }
        };

        let state = PromptState::compose(
            &self.persona,
            profile,
            post,
            &thread,
            &history,
            &self.config.priority_handles(),
        );

        let prompt = state.render(&self.templates.should_respond);
        let raw = self.bounded(self.generator.classify(&prompt)).await?;
        let decision = Decision::parse(&raw);
        info!("interactions: {} -> {decision:?}", post.id);

        match decision {
            Decision::Ignore => Ok(GateOutcome::Ignored),
            Decision::Stop => Ok(GateOutcome::Stopped),
            Decision::Respond => {
                let prompt = state.render(&self.templates.message);
                let content = self.bounded(self.generator.generate(&prompt)).await?;
                if content.text.trim().is_empty() {
                    debug!("interactions: empty reply generated for {}", post.id);
                    Ok(GateOutcome::Empty)
                } else {
                    Ok(GateOutcome::Reply(content))
                }
            }
        }
    }

    /// Walk `in_reply_to_id` up from `post`, at most `thread_depth` parents.
    ///
    /// Returns the chain oldest first, ending with `post`. A missing or
    /// unreachable parent ends the walk.
    pub(crate) async fn build_thread(&self, post: &Post) -> Vec<Post> {
        let mut chain = vec![post.clone()];
        let mut parent = post.in_reply_to_id.clone();

        while let Some(id) = parent {
            if chain.len() > self.config.thread_depth {
                break;
            }
            match self.platform.fetch_post(&id).await {
                Ok(Some(p)) => {
                    parent = p.in_reply_to_id.clone();
                    chain.push(p);
                }
                Ok(None) => {
                    debug!("interactions: parent {id} not available");
                    break;
                }
                Err(e) => {
                    warn!("interactions: failed to fetch parent {id}: {e}");
                    break;
                }
            }
        }

        chain.reverse();
        chain
    }

    /// Run a generation call under the configured timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, MurmurError>>,
    ) -> Result<T, InteractionError> {
        let secs = self.config.generation_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), call).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(InteractionError::Generation(e)),
            Err(_) => Err(InteractionError::Timeout(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_labels() {
        assert_eq!(Decision::parse("RESPOND"), Decision::Respond);
        assert_eq!(Decision::parse("IGNORE"), Decision::Ignore);
        assert_eq!(Decision::parse("STOP"), Decision::Stop);
    }

    #[test]
    fn test_parse_tolerates_brackets_and_whitespace() {
        assert_eq!(Decision::parse("  [RESPOND]\n"), Decision::Respond);
        assert_eq!(Decision::parse("[STOP]"), Decision::Stop);
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        for raw in [
            "respond",
            "RESPOND.",
            "[[RESPOND]]",
            "RESPOND please",
            "[RESPOND",
            "",
            "Sure! [RESPOND]",
        ] {
            assert_eq!(Decision::parse(raw), Decision::Ignore, "{raw:?}");
        }
    }
}
