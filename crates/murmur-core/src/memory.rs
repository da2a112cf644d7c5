//! Conversation memory records and stable derived identifiers.

use crate::post::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Map an arbitrary string onto a stable UUID (v5, OID namespace).
pub fn string_to_uuid(s: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, s.as_bytes())
}

/// Agent id derived from the platform account id.
pub fn agent_id(profile_id: &str) -> Uuid {
    string_to_uuid(profile_id)
}

/// Memory key for a post as seen by one agent: `uuid("{post_id}-{agent_id}")`.
pub fn memory_id(post_id: &PostId, agent_id: &Uuid) -> Uuid {
    string_to_uuid(&format!("{post_id}-{agent_id}"))
}

/// Room key for a conversation thread as seen by one agent.
pub fn room_id(conversation_id: &str, agent_id: &Uuid) -> Uuid {
    string_to_uuid(&format!("{conversation_id}-{agent_id}"))
}

/// What a memory record stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A post the agent replied to. Its presence means "already answered".
    Answered,
    /// A post the agent sent.
    Reply,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Reply => "reply",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "answered" => Some(Self::Answered),
            "reply" => Some(Self::Reply),
            _ => None,
        }
    }
}

/// A single conversation memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub room_id: Uuid,
    pub kind: MemoryKind,
    pub post_id: PostId,
    /// Handle of whoever wrote `content`.
    pub author_handle: String,
    /// Handle of the user the agent was talking to.
    pub counterpart: String,
    pub content: String,
    pub url: Option<String>,
    /// Memory id of the post this one replies to.
    pub in_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// How a dispatch attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    DryRun,
    Failed,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::DryRun => "dry_run",
            Self::Failed => "failed",
        }
    }
}

/// An audit entry for one reply dispatch.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    pub agent_id: Uuid,
    pub post_id: PostId,
    pub author_handle: String,
    pub outcome: DispatchOutcome,
    pub sent_posts: usize,
    pub detail: Option<String>,
}
