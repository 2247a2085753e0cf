use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use console_api::{ViewSettings, DEFAULT_PAGE_SIZE};
use console_core::{Timings, DEFAULT_ACTION_LATENCY, DEFAULT_FETCH_LATENCY};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub action_latency_ms: u64,
    pub fetch_latency_ms: u64,
    pub default_email: String,
    pub strict_login: bool,
    pub page_size: usize,
    pub placeholder_image_url: String,
    pub fallback_image_url: String,
    pub fallback_link_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        let view = ViewSettings::default();
        Self {
            action_latency_ms: DEFAULT_ACTION_LATENCY.as_millis() as u64,
            fetch_latency_ms: DEFAULT_FETCH_LATENCY.as_millis() as u64,
            default_email: "admin@example.com".into(),
            strict_login: view.strict_login,
            page_size: DEFAULT_PAGE_SIZE,
            placeholder_image_url: view.placeholder_image_url,
            fallback_image_url: view.fallback_image_url,
            fallback_link_url: view.fallback_link_url,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn timings(&self) -> Timings {
        Timings {
            action: Duration::from_millis(self.action_latency_ms),
            fetch: Duration::from_millis(self.fetch_latency_ms),
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            strict_login: self.strict_login,
            page_size: self.page_size,
            placeholder_image_url: self.placeholder_image_url.clone(),
            fallback_image_url: self.fallback_image_url.clone(),
            fallback_link_url: self.fallback_link_url.clone(),
        }
    }
}

/// Keys accepted in the TOML file; anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    action_latency_ms: Option<u64>,
    fetch_latency_ms: Option<u64>,
    default_email: Option<String>,
    strict_login: Option<bool>,
    page_size: Option<usize>,
    placeholder_image_url: Option<String>,
    fallback_image_url: Option<String>,
    fallback_link_url: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicitly named file must exist; the default `console.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("invalid console config")?;

    if let Some(v) = file_cfg.action_latency_ms {
        settings.action_latency_ms = v;
    }
    if let Some(v) = file_cfg.fetch_latency_ms {
        settings.fetch_latency_ms = v;
    }
    if let Some(v) = file_cfg.default_email {
        settings.default_email = v;
    }
    if let Some(v) = file_cfg.strict_login {
        settings.strict_login = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.placeholder_image_url {
        settings.placeholder_image_url = v;
    }
    if let Some(v) = file_cfg.fallback_image_url {
        settings.fallback_image_url = v;
    }
    if let Some(v) = file_cfg.fallback_link_url {
        settings.fallback_link_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

/// `APP__<KEY>` takes precedence over `CONSOLE_<KEY>`.
/// Unparseable numbers and booleans are ignored.
pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let var = |key: &str| {
        lookup(&format!("APP__{key}")).or_else(|| lookup(&format!("CONSOLE_{key}")))
    };

    if let Some(v) = var("ACTION_LATENCY_MS").and_then(|v| v.trim().parse().ok()) {
        settings.action_latency_ms = v;
    }
    if let Some(v) = var("FETCH_LATENCY_MS").and_then(|v| v.trim().parse().ok()) {
        settings.fetch_latency_ms = v;
    }
    if let Some(v) = var("DEFAULT_EMAIL") {
        settings.default_email = v;
    }
    if let Some(v) = var("STRICT_LOGIN").and_then(|v| parse_flag(&v)) {
        settings.strict_login = v;
    }
    if let Some(v) = var("PAGE_SIZE").and_then(|v| v.trim().parse().ok()) {
        settings.page_size = v;
    }
    if let Some(v) = var("PLACEHOLDER_IMAGE_URL") {
        settings.placeholder_image_url = v;
    }
    if let Some(v) = var("FALLBACK_IMAGE_URL") {
        settings.fallback_image_url = v;
    }
    if let Some(v) = var("FALLBACK_LINK_URL") {
        settings.fallback_link_url = v;
    }
    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
