//! Priority quota, self exclusion, and de-duplication.

use super::InteractionState;
use murmur_core::post::{Post, Watermark};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Whether a priority author's post may be picked this cycle.
///
/// Must be newer than the watermark, an original post (no reply, no
/// retweet), and younger than the recency window.
pub(crate) fn is_eligible(
    post: &Post,
    watermark: Option<&Watermark>,
    now: i64,
    window_hours: i64,
) -> bool {
    let newer = match watermark {
        None => true,
        Some(w) => match post.id.numeric() {
            Some(id) => w.is_behind(&id),
            None => {
                warn!("interactions: non-numeric post id {}, treated as seen", post.id);
                false
            }
        },
    };
    let recent = now.saturating_sub(post.timestamp) < window_hours.saturating_mul(3600);
    newer && !post.is_reply && !post.is_retweet && recent
}

/// Pick at most one eligible post per priority author, uniformly at random.
///
/// Authors already granted an interaction this cycle are skipped; a granted
/// author is recorded in `state.daily_quota_used`.
pub(crate) fn select_priority<R: Rng + ?Sized>(
    by_author: Vec<(String, Vec<Post>)>,
    state: &mut InteractionState,
    now: i64,
    window_hours: i64,
    rng: &mut R,
) -> Vec<Post> {
    let mut picks = Vec::new();

    for (author, posts) in by_author {
        let key = author.to_lowercase();
        if state.daily_quota_used.contains(&key) {
            debug!("interactions: @{author} already granted this cycle");
            continue;
        }

        let eligible: Vec<Post> = posts
            .into_iter()
            .filter(|p| is_eligible(p, state.last_processed_id.as_ref(), now, window_hours))
            .collect();

        if let Some(post) = eligible.choose(rng) {
            debug!("interactions: picked {} from @{author}", post.id);
            picks.push(post.clone());
            state.daily_quota_used.insert(key);
        }
    }

    picks
}

/// Merge mention results with priority picks.
///
/// The first occurrence of an id wins; posts written by the agent itself
/// are removed.
pub(crate) fn combine(mentions: Vec<Post>, picks: Vec<Post>, self_id: &str) -> Vec<Post> {
    let mut seen = HashSet::new();
    mentions
        .into_iter()
        .chain(picks)
        .filter(|p| p.author_id != self_id)
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::post::PostId;

    fn post(id: &str, timestamp: i64) -> Post {
        Post {
            id: PostId::new(id),
            author_id: "1".into(),
            author_handle: "alice".into(),
            author_name: None,
            text: "hi".into(),
            conversation_id: id.into(),
            in_reply_to_id: None,
            timestamp,
            is_reply: false,
            is_retweet: false,
            permanent_url: String::new(),
        }
    }

    #[test]
    fn test_recency_window() {
        let now = 1_800_000_000;
        assert!(is_eligible(&post("100", now - 3599), None, now, 1));
        assert!(!is_eligible(&post("100", now - 3600), None, now, 1));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let now = 1_800_000_000;
        assert!(is_eligible(&post("100", now - 86_400), None, now, i64::MAX));
    }
}
