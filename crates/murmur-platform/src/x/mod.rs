//! X (formerly Twitter) API v2 client.
//!
//! Search uses `GET /tweets/search/recent`, replies use `POST /tweets`.
//! Docs: <https://docs.x.com/x-api>

mod client;
pub(crate) mod types;


use murmur_core::{config::PlatformConfig, post::Profile};
use tokio::sync::Mutex;

/// Upper and lower bounds of `max_results` on the recent search endpoint.
pub(crate) const SEARCH_MIN_RESULTS: usize = 10;
pub(crate) const SEARCH_MAX_RESULTS: usize = 100;

/// X API v2 client authenticated with a user-context bearer token.
pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
    /// Cached `GET /users/me` result.
    profile: Mutex<Option<Profile>>,
}

impl XClient {
    /// Create a new client from config.
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
            profile: Mutex::new(None),
        }
    }
}

/// Clamp a requested result count to what the search endpoint accepts.
pub(crate) fn search_page_size(limit: usize) -> usize {
    limit.clamp(SEARCH_MIN_RESULTS, SEARCH_MAX_RESULTS)
}
