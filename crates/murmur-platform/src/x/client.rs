//! `PlatformClient` implementation over the X API v2.

use super::types::{
    users_by_id, XCreatedTweet, XResponse, XTweet, XUser, EXPANSIONS, TWEET_FIELDS, USER_FIELDS,
    WEB_ORIGIN,
};
use super::{search_page_size, XClient};
use async_trait::async_trait;
use murmur_core::{
    error::MurmurError,
    post::{Post, PostId, Profile, SearchMode},
    traits::PlatformClient,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

fn sort_order(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Latest => "recency",
        SearchMode::Top => "relevancy",
    }
}

impl XClient {
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<XResponse<T>, MurmurError> {
        let url = format!("{}{path}", self.base_url);
        debug!("x: GET {url}");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
            .map_err(|e| MurmurError::Platform(format!("x request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MurmurError::Platform(format!(
                "x GET {path} failed ({status}): {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| MurmurError::Platform(format!("x: failed to parse {path}: {e}")))
    }

    /// Run a recent search and convert the page into posts.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<Post>, MurmurError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let params = [
            ("query", query.to_string()),
            ("max_results", search_page_size(limit).to_string()),
            ("sort_order", sort_order(mode).to_string()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", EXPANSIONS.to_string()),
            ("user.fields", USER_FIELDS.to_string()),
        ];
        let body: XResponse<Vec<XTweet>> = self.get_json("/tweets/search/recent", &params).await?;

        for err in &body.errors {
            warn!("x search partial error: {}", err.describe());
        }

        let users = users_by_id(body.includes.as_ref());
        let mut posts: Vec<Post> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.into_post(&users))
            .collect();
        posts.truncate(limit);
        Ok(posts)
    }
}

#[async_trait]
impl PlatformClient for XClient {
    fn name(&self) -> &str {
        "x"
    }

    async fn profile(&self) -> Result<Profile, MurmurError> {
        let mut cached = self.profile.lock().await;
        if let Some(ref p) = *cached {
            return Ok(p.clone());
        }

        let body: XResponse<XUser> = self
            .get_json("/users/me", &[("user.fields", USER_FIELDS.to_string())])
            .await?;
        let user = body.data.ok_or_else(|| {
            let reason = body
                .errors
                .first()
                .map(|e| e.describe())
                .unwrap_or_else(|| "no user in response".to_string());
            MurmurError::Platform(format!("x: profile lookup failed: {reason}"))
        })?;

        let profile = Profile {
            id: user.id,
            handle: user.username,
            name: user.name,
        };
        *cached = Some(profile.clone());
        Ok(profile)
    }

    async fn search_recent_posts(
        &self,
        query: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<Post>, MurmurError> {
        self.search(query, limit, mode).await
    }

    async fn fetch_author_posts(
        &self,
        handle: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<Post>, MurmurError> {
        let handle = handle.trim_start_matches('@');
        self.search(&format!("from:{handle}"), limit, mode).await
    }

    async fn fetch_post(&self, id: &PostId) -> Result<Option<Post>, MurmurError> {
        let params = [
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", EXPANSIONS.to_string()),
            ("user.fields", USER_FIELDS.to_string()),
        ];
        let body: XResponse<XTweet> = self.get_json(&format!("/tweets/{id}"), &params).await?;

        // Deleted or protected posts come back as 200 with an `errors` array.
        let Some(tweet) = body.data else {
            if let Some(err) = body.errors.first() {
                debug!("x: post {id} unavailable: {}", err.describe());
            }
            return Ok(None);
        };
        let users = users_by_id(body.includes.as_ref());
        Ok(tweet.into_post(&users))
    }

    async fn send_post(
        &self,
        text: &str,
        in_reply_to: Option<&PostId>,
    ) -> Result<Post, MurmurError> {
        let me = self.profile().await?;

        let mut body = serde_json::json!({ "text": text });
        if let Some(parent) = in_reply_to {
            body["reply"] = serde_json::json!({ "in_reply_to_tweet_id": parent.as_str() });
        }

        let url = format!("{}/tweets", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MurmurError::Platform(format!("x send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(MurmurError::Platform(format!(
                "x send failed ({status}): {error_text}"
            )));
        }

        let created: XResponse<XCreatedTweet> = resp
            .json()
            .await
            .map_err(|e| MurmurError::Platform(format!("x: failed to parse send response: {e}")))?;
        let tweet = created
            .data
            .ok_or_else(|| MurmurError::Platform("x: send response had no data".into()))?;

        Ok(created_post(tweet, &me, in_reply_to))
    }
}

/// Build the [`Post`] for a tweet we just created.
///
/// The create endpoint does not echo the conversation id, so the new post
/// is treated as its own root; callers that need the thread use the parent's.
pub(crate) fn created_post(tweet: XCreatedTweet, me: &Profile, in_reply_to: Option<&PostId>) -> Post {
    Post {
        permanent_url: format!("{WEB_ORIGIN}/{}/status/{}", me.handle, tweet.id),
        conversation_id: tweet.id.clone(),
        id: PostId::new(tweet.id),
        author_id: me.id.clone(),
        author_handle: me.handle.clone(),
        author_name: me.name.clone(),
        text: tweet.text,
        in_reply_to_id: in_reply_to.cloned(),
        timestamp: chrono::Utc::now().timestamp(),
        is_reply: in_reply_to.is_some(),
        is_retweet: false,
    }
}
