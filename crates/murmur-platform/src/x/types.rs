//! X API v2 deserialization types.

use chrono::DateTime;
use murmur_core::post::{Post, PostId};
use serde::Deserialize;
use std::collections::HashMap;

/// Fields requested on every tweet lookup.
pub(crate) const TWEET_FIELDS: &str =
    "author_id,conversation_id,created_at,referenced_tweets,in_reply_to_user_id";
pub(crate) const USER_FIELDS: &str = "username,name";
pub(crate) const EXPANSIONS: &str = "author_id";

/// Public web origin used for permanent post URLs.
pub(crate) const WEB_ORIGIN: &str = "https://x.com";

#[derive(Debug, Deserialize)]
pub(crate) struct XResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub includes: Option<XIncludes>,
    #[serde(default)]
    pub errors: Vec<XApiError>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XIncludes {
    #[serde(default)]
    pub users: Vec<XUser>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct XApiError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct XUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XTweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub referenced_tweets: Vec<XReference>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XReference {
    /// "replied_to", "quoted", or "retweeted".
    #[serde(rename = "type")]
    pub ref_type: String,
    pub id: String,
}

/// Body returned by `POST /tweets`.
#[derive(Debug, Deserialize)]
pub(crate) struct XCreatedTweet {
    pub id: String,
    pub text: String,
}

impl XApiError {
    pub fn describe(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Index expanded users by id.
pub(crate) fn users_by_id(includes: Option<&XIncludes>) -> HashMap<&str, &XUser> {
    includes
        .map(|inc| inc.users.iter().map(|u| (u.id.as_str(), u)).collect())
        .unwrap_or_default()
}

impl XTweet {
    /// Convert to a [`Post`], resolving the author through expanded users.
    ///
    /// Tweets whose author cannot be resolved are dropped: without a handle
    /// the agent can neither quota nor address them.
    pub fn into_post(self, users: &HashMap<&str, &XUser>) -> Option<Post> {
        let author_id = self.author_id?;
        let user = users.get(author_id.as_str())?;

        let in_reply_to_id = self
            .referenced_tweets
            .iter()
            .find(|r| r.ref_type == "replied_to")
            .map(|r| PostId::new(r.id.clone()));
        let is_retweet = self
            .referenced_tweets
            .iter()
            .any(|r| r.ref_type == "retweeted");
        let timestamp = self
            .created_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.timestamp())
            .unwrap_or(0);

        Some(Post {
            permanent_url: format!("{WEB_ORIGIN}/{}/status/{}", user.username, self.id),
            conversation_id: self.conversation_id.unwrap_or_else(|| self.id.clone()),
            id: PostId::new(self.id),
            author_id,
            author_handle: user.username.clone(),
            author_name: user.name.clone(),
            text: self.text,
            is_reply: in_reply_to_id.is_some(),
            in_reply_to_id,
            timestamp,
            is_retweet,
        })
    }
}
