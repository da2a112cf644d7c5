use super::*;
use std::collections::HashMap;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.murmur.name, "murmur");
    assert_eq!(cfg.interactions.poll_interval_secs, 120);
    assert_eq!(cfg.interactions.mention_limit, 20);
    assert_eq!(cfg.interactions.author_limit, 3);
    assert_eq!(cfg.interactions.recency_window_hours, 24);
    assert_eq!(cfg.interactions.max_post_length, 280);
    assert_eq!(
        cfg.interactions.candidate_order,
        CandidateOrder::Lexicographic
    );
    assert!(cfg.interactions.enabled);
    assert!(!cfg.platform.dry_run);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_interactions_from_toml() {
    let toml_str = r#"
        [interactions]
        poll_interval_secs = 300
        priority_authors = ["@alice", "bob", "  "]
        candidate_order = "numeric"
        thread_depth = 4
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.interactions.poll_interval_secs, 300);
    assert_eq!(cfg.interactions.candidate_order, CandidateOrder::Numeric);
    assert_eq!(cfg.interactions.thread_depth, 4);
    // Untouched fields keep their defaults.
    assert_eq!(cfg.interactions.mention_limit, 20);
    assert_eq!(cfg.interactions.priority_handles(), vec!["alice", "bob"]);
}

#[test]
fn test_persona_partial_override() {
    let toml_str = r#"
        [persona]
        name = "scout"
        topics = ["rust"]
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.persona.name, "scout");
    assert_eq!(cfg.persona.topics, vec!["rust"]);
    // Unset persona fields fall back to the default character.
    assert!(!cfg.persona.bio.is_empty());
}

#[test]
fn test_validate_rejects_zero_interval() {
    let mut cfg = Config::default();
    cfg.interactions.poll_interval_secs = 0;
    assert!(matches!(cfg.validate(), Err(MurmurError::Config(_))));
}

#[test]
fn test_validate_rejects_inverted_delay() {
    let mut cfg = Config::default();
    cfg.interactions.reply_delay_min_ms = 5000;
    cfg.interactions.reply_delay_max_ms = 1000;
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("reply_delay_min_ms"));
}

#[test]
fn test_validate_bounds_recency_window() {
    let mut cfg = Config::default();
    cfg.interactions.recency_window_hours = MAX_RECENCY_WINDOW_HOURS;
    assert!(cfg.validate().is_ok());

    cfg.interactions.recency_window_hours = i64::MAX / 1000;
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("recency_window_hours"));
}

#[test]
fn test_validate_rejects_zero_post_length() {
    let mut cfg = Config::default();
    cfg.interactions.max_post_length = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_env_overrides_secrets() {
    let mut cfg = Config::default();
    cfg.platform.bearer_token = "from-file".into();
    let env: HashMap<&str, &str> = [
        (ENV_PLATFORM_TOKEN, "from-env"),
        (ENV_PROVIDER_API_KEY, "sk-env"),
    ]
    .into_iter()
    .collect();
    cfg.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.platform.bearer_token, "from-env");
    assert_eq!(cfg.provider.api_key, "sk-env");
}

#[test]
fn test_empty_env_does_not_clear_secret() {
    let mut cfg = Config::default();
    cfg.provider.api_key = "sk-file".into();
    cfg.apply_env_from(|_| Some(String::new()));
    assert_eq!(cfg.provider.api_key, "sk-file");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__murmur_config__.toml").unwrap();
    assert_eq!(cfg.interactions.poll_interval_secs, 120);
}

#[test]
fn test_load_rejects_malformed_toml() {
    let tmp = std::env::temp_dir().join("__murmur_test_bad_config__.toml");
    std::fs::write(&tmp, "[interactions\npoll = ").unwrap();
    let result = load(tmp.to_str().unwrap());
    assert!(matches!(result, Err(MurmurError::Config(_))));
    let _ = std::fs::remove_file(&tmp);
}

#[test]
fn test_install_bundled_templates_does_not_overwrite() {
    let tmp = std::env::temp_dir().join("__murmur_test_bundled_templates__");
    let _ = std::fs::remove_dir_all(&tmp);

    install_bundled_templates(tmp.to_str().unwrap());
    let path = tmp.join("prompts").join(TEMPLATES_FILE);
    assert!(path.exists(), "TEMPLATES.md should be deployed");

    std::fs::write(&path, "## Message\ncustom {{current_post}}\n").unwrap();
    install_bundled_templates(tmp.to_str().unwrap());
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains("custom"));

    // Only the overridden section changes.
    let loaded = Templates::load(tmp.to_str().unwrap());
    assert_eq!(loaded.message, "custom {{current_post}}");
    assert_eq!(loaded.should_respond, Templates::default().should_respond);

    let _ = std::fs::remove_dir_all(&tmp);
}
