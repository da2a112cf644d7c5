//! Candidate discovery from mentions and priority authors.

use super::InteractionError;
use murmur_core::{
    post::{Post, SearchMode},
    traits::PlatformClient,
};
use tracing::{debug, warn};

/// Raw posts from both discovery sources.
#[derive(Debug, Default)]
pub(crate) struct Discovered {
    /// Posts addressing the agent: mentions, replies, quotes.
    pub mentions: Vec<Post>,
    /// Recent posts per priority author, in configured author order.
    pub by_author: Vec<(String, Vec<Post>)>,
}

impl Discovered {
    pub fn len(&self) -> usize {
        self.mentions.len() + self.by_author.iter().map(|(_, p)| p.len()).sum::<usize>()
    }
}

/// Search query matching posts that address `handle`.
pub(crate) fn mention_query(handle: &str) -> String {
    format!("@{handle} OR to:{handle} OR quoted_tweet_id:{handle}")
}

/// Query both sources. Only a mention-search failure fails discovery;
/// a priority author whose fetch fails is logged and left out.
pub(crate) async fn discover(
    platform: &dyn PlatformClient,
    handle: &str,
    priority_authors: &[String],
    mention_limit: usize,
    author_limit: usize,
) -> Result<Discovered, InteractionError> {
    let mentions = platform
        .search_recent_posts(&mention_query(handle), mention_limit, SearchMode::Latest)
        .await
        .map_err(InteractionError::Discovery)?;
    debug!("interactions: {} mention candidates", mentions.len());

    let mut by_author = Vec::with_capacity(priority_authors.len());
    for author in priority_authors {
        match platform
            .fetch_author_posts(author, author_limit, SearchMode::Latest)
            .await
        {
            Ok(posts) => {
                debug!("interactions: {} recent posts from @{author}", posts.len());
                by_author.push((author.clone(), posts));
            }
            Err(e) => warn!("interactions: failed to fetch posts from @{author}: {e}"),
        }
    }

    Ok(Discovered {
        mentions,
        by_author,
    })
}
