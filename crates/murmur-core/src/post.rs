//! Platform posts and their identifiers.

use crate::error::MurmurError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A platform post identifier, kept as the platform's decimal string.
///
/// `Ord` on this type is plain string order. Use [`PostId::numeric`] when
/// the numeric value matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as an arbitrary-precision number, or `None` if it is not decimal.
    pub fn numeric(&self) -> Option<Watermark> {
        Watermark::parse(&self.0).ok()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The highest post id that has been fully processed.
///
/// Stored as a normalized decimal string (no sign, no leading zeros) so ids
/// of any length compare numerically: shorter is smaller, equal lengths
/// compare digit by digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Watermark(String);

impl Watermark {
    /// Parse a non-negative decimal integer of any length.
    pub fn parse(raw: &str) -> Result<Self, MurmurError> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MurmurError::InvalidPostId(raw.to_string()));
        }
        let digits = raw.trim_start_matches('0');
        if digits.is_empty() {
            Ok(Self("0".to_string()))
        } else {
            Ok(Self(digits.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `id` is strictly newer than this watermark.
    pub fn is_behind(&self, id: &Watermark) -> bool {
        id > self
    }
}

impl Ord for Watermark {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Watermark {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A post as returned by the platform client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Platform user id of the author.
    pub author_id: String,
    /// Author handle, without the leading `@`.
    pub author_handle: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub text: String,
    /// Id of the root post of the thread this post belongs to.
    pub conversation_id: String,
    /// The post this one replies to, if any.
    #[serde(default)]
    pub in_reply_to_id: Option<PostId>,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub is_retweet: bool,
    pub permanent_url: String,
}

/// The agent's own account on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub handle: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Result ordering requested from the platform's search endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Most recent first.
    #[default]
    Latest,
    /// Platform relevance ranking.
    Top,
}
