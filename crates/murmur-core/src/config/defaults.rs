//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "murmur".to_string()
}

pub fn default_data_dir() -> String {
    "~/.murmur".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_platform_base_url() -> String {
    "https://api.x.com/2".to_string()
}

pub fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_model_large() -> String {
    "gpt-4o".to_string()
}

pub fn default_db_path() -> String {
    "~/.murmur/data/memory.db".to_string()
}

pub fn default_recent_interactions() -> usize {
    10
}

pub fn default_poll_interval() -> u64 {
    120
}

pub fn default_mention_limit() -> usize {
    20
}

pub fn default_author_limit() -> usize {
    3
}

pub fn default_recency_window_hours() -> i64 {
    24
}

pub fn default_thread_depth() -> usize {
    10
}

pub fn default_max_post_length() -> usize {
    280
}

pub fn default_reply_delay_min_ms() -> u64 {
    1500
}

pub fn default_reply_delay_max_ms() -> u64 {
    3500
}

pub fn default_generation_timeout_secs() -> u64 {
    120
}
