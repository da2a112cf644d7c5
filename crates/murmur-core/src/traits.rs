use crate::{
    error::MurmurError,
    memory::{DispatchEntry, DispatchOutcome, MemoryRecord},
    post::{Post, PostId, Profile, SearchMode, Watermark},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Social platform client: where posts come from and go to.
///
/// Every platform backend implements this trait so the interaction
/// pipeline never talks HTTP directly.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Human-readable platform name.
    fn name(&self) -> &str;

    /// The authenticated account.
    async fn profile(&self) -> Result<Profile, MurmurError>;

    /// Search recent posts matching a query.
    async fn search_recent_posts(
        &self,
        query: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<Post>, MurmurError>;

    /// Most recent posts written by `handle`.
    async fn fetch_author_posts(
        &self,
        handle: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<Post>, MurmurError>;

    /// Look up a single post. `Ok(None)` when it does not exist or is hidden.
    async fn fetch_post(&self, id: &PostId) -> Result<Option<Post>, MurmurError>;

    /// Publish a post, optionally as a reply.
    async fn send_post(&self, text: &str, in_reply_to: Option<&PostId>)
        -> Result<Post, MurmurError>;
}

/// Free-text output of the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
}

/// Generation service.
///
/// Takes fully rendered prompts; prompt composition happens in the pipeline.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Answer a should-respond prompt with a single label
    /// (`RESPOND`, `IGNORE`, `STOP`, or anything else the model produced).
    async fn classify(&self, prompt: &str) -> Result<String, MurmurError>;

    /// Produce reply content for a message prompt.
    async fn generate(&self, prompt: &str) -> Result<GeneratedContent, MurmurError>;

    /// Check if the provider is reachable and configured.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Persistence for the watermark and conversation memory.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn get_watermark(&self, agent_id: &Uuid) -> Result<Option<Watermark>, MurmurError>;

    async fn set_watermark(&self, agent_id: &Uuid, watermark: &Watermark)
        -> Result<(), MurmurError>;

    async fn get_memory(&self, id: &Uuid) -> Result<Option<MemoryRecord>, MurmurError>;

    /// Insert a record. Writing an id that already exists is not an error.
    async fn put_memory(&self, record: &MemoryRecord) -> Result<(), MurmurError>;

    /// Latest records exchanged with `counterpart`, oldest first.
    async fn recent_memories_for(
        &self,
        agent_id: &Uuid,
        counterpart: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MurmurError>;

    /// Record a dispatch attempt. Stores without an audit trail ignore it.
    async fn log_dispatch(&self, _entry: &DispatchEntry) -> Result<(), MurmurError> {
        Ok(())
    }

    /// Whether a dispatch of `post_id` with `outcome` was already logged.
    async fn has_dispatch(
        &self,
        _agent_id: &Uuid,
        _post_id: &PostId,
        _outcome: DispatchOutcome,
    ) -> Result<bool, MurmurError> {
        Ok(false)
    }
}
