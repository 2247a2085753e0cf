use super::{apply_env_overrides, apply_file, load_settings, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_mirror_the_demo_console() {
    let settings = Settings::default();
    assert_eq!(settings.action_latency_ms, 500);
    assert_eq!(settings.fetch_latency_ms, 300);
    assert_eq!(settings.default_email, "admin@example.com");
    assert!(!settings.strict_login);
    assert_eq!(settings.page_size, 10);
    assert_eq!(settings.fallback_link_url, "https://example.com");
    assert_eq!(settings.timings().action, Duration::from_millis(500));
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        action_latency_ms = 0
        strict_login = true
        fallback_link_url = "https://example.com/home"
        "#,
    )
    .expect("valid toml");

    assert_eq!(settings.action_latency_ms, 0);
    assert!(settings.strict_login);
    assert_eq!(settings.fallback_link_url, "https://example.com/home");
    assert_eq!(settings.fetch_latency_ms, 300);
    assert!(settings.view_settings().strict_login);
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "bind_addr = \"0.0.0.0:1\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_console_prefix() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("CONSOLE_PAGE_SIZE", "20"),
            ("APP__PAGE_SIZE", "50"),
            ("CONSOLE_DEFAULT_EMAIL", "operator@example.com"),
            ("CONSOLE_STRICT_LOGIN", "yes"),
        ]),
    );
    assert_eq!(settings.page_size, 50);
    assert_eq!(settings.default_email, "operator@example.com");
    assert!(settings.strict_login);
}

#[test]
fn malformed_env_numbers_keep_previous_value() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("CONSOLE_ACTION_LATENCY_MS", "soon"),
            ("CONSOLE_STRICT_LOGIN", "maybe"),
        ]),
    );
    assert_eq!(settings.action_latency_ms, 500);
    assert!(!settings.strict_login);
}

#[test]
fn explicit_config_path_must_exist() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("banner_console_missing_{suffix}.toml"));
    assert!(load_settings(Some(&missing)).is_err());
}

#[test]
fn explicit_config_file_is_loaded() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("banner_console_config_{suffix}.toml"));
    fs::write(&path, "fetch_latency_ms = 5\n").expect("write config");

    let settings = load_settings(Some(&path)).expect("load");
    assert_eq!(settings.fetch_latency_ms, 5);

    fs::remove_file(path).expect("cleanup");
}
