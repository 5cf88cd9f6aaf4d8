use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use reactions::ReactionSettings;

pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub example_delay_ms: u64,
    pub token_load_delay_ms: u64,
    pub price_load_delay_ms: u64,
    pub bundling_delay_ms: u64,
    pub wallet_connect_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            example_delay_ms: 600,
            token_load_delay_ms: 600,
            price_load_delay_ms: 350,
            bundling_delay_ms: 1400,
            wallet_connect_delay_ms: 1000,
        }
    }
}

impl Settings {
    pub fn reaction_settings(&self) -> ReactionSettings {
        ReactionSettings {
            example_delay: Duration::from_millis(self.example_delay_ms),
            token_load_delay: Duration::from_millis(self.token_load_delay_ms),
            price_load_delay: Duration::from_millis(self.price_load_delay_ms),
            bundling_delay: Duration::from_millis(self.bundling_delay_ms),
        }
    }

    pub fn wallet_connect_delay(&self) -> Duration {
        Duration::from_millis(self.wallet_connect_delay_ms)
    }
}

/// Defaults, then `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = env("DASHBOARD__LOG_FILTER") {
        settings.log_filter = v;
    }

    let delays: [(&str, &mut u64); 5] = [
        ("DASHBOARD__EXAMPLE_DELAY_MS", &mut settings.example_delay_ms),
        ("DASHBOARD__TOKEN_LOAD_DELAY_MS", &mut settings.token_load_delay_ms),
        ("DASHBOARD__PRICE_LOAD_DELAY_MS", &mut settings.price_load_delay_ms),
        ("DASHBOARD__BUNDLING_DELAY_MS", &mut settings.bundling_delay_ms),
        (
            "DASHBOARD__WALLET_CONNECT_DELAY_MS",
            &mut settings.wallet_connect_delay_ms,
        ),
    ];
    for (key, slot) in delays {
        if let Some(v) = env(key) {
            *slot = v
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of milliseconds"))?;
        }
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: toml::Table = toml::from_str(raw)?;

    if let Some(v) = table.get("log_filter") {
        settings.log_filter = v
            .as_str()
            .context("log_filter must be a string")?
            .to_string();
    }

    let delays: [(&str, &mut u64); 5] = [
        ("example_delay_ms", &mut settings.example_delay_ms),
        ("token_load_delay_ms", &mut settings.token_load_delay_ms),
        ("price_load_delay_ms", &mut settings.price_load_delay_ms),
        ("bundling_delay_ms", &mut settings.bundling_delay_ms),
        ("wallet_connect_delay_ms", &mut settings.wallet_connect_delay_ms),
    ];
    for (key, slot) in delays {
        if let Some(v) = table.get(key) {
            let millis = v
                .as_integer()
                .and_then(|millis| u64::try_from(millis).ok())
                .with_context(|| format!("{key} must be a non-negative integer"))?;
            *slot = millis;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
