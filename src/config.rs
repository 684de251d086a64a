use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extractor::SeasonRule;
use crate::{AGGREGATE_REGION, CHAT_API_BASE, STATS_API_BASE};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Optional settings file deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Pause in seconds after every full pass over the players.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Pause in milliseconds between two player fetches.
    #[serde(default = "default_player_delay")]
    pub player_delay_ms: u64,
    /// Status report period in seconds; 0 disables it.
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
    /// Timeout applied to every HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_aggregate_region")]
    pub aggregate_region: String,
}

fn default_poll_interval() -> u64 {
    15
}

fn default_player_delay() -> u64 {
    1000
}

fn default_status_interval() -> u64 {
    900
}

fn default_request_timeout() -> u64 {
    10
}

fn default_aggregate_region() -> String {
    AGGREGATE_REGION.to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            player_delay_ms: default_player_delay(),
            status_interval_secs: default_status_interval(),
            request_timeout_secs: default_request_timeout(),
            aggregate_region: default_aggregate_region(),
        }
    }
}

/// API base URLs, overridable for testing against mock servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_stats_api_base")]
    pub stats_api_base: String,
    #[serde(default = "default_chat_api_base")]
    pub chat_api_base: String,
}

fn default_stats_api_base() -> String {
    STATS_API_BASE.to_string()
}

fn default_chat_api_base() -> String {
    CHAT_API_BASE.to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            stats_api_base: default_stats_api_base(),
            chat_api_base: default_chat_api_base(),
        }
    }
}

impl EndpointsConfig {
    pub fn stats_url(&self) -> Result<Url> {
        Url::parse(&self.stats_api_base)
            .with_context(|| format!("invalid stats_api_base {:?}", self.stats_api_base))
    }

    pub fn chat_url(&self) -> Result<Url> {
        Url::parse(&self.chat_api_base)
            .with_context(|| format!("invalid chat_api_base {:?}", self.chat_api_base))
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Load config if the file exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.settings.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        if config.settings.aggregate_region.trim().is_empty() {
            anyhow::bail!("aggregate_region must be non-empty");
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }
}

/// Everything the poll loop needs, built once at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub channel: String,
    /// Monitored handles in visiting order.
    pub players: Vec<String>,
    pub season: Option<String>,
    pub track_matches: bool,
    pub aggregate_region: String,
    pub poll_interval: Duration,
    pub player_delay: Duration,
    pub status_interval: Option<Duration>,
}

impl MonitorConfig {
    pub fn new(
        settings: &SettingsConfig,
        channel: &str,
        players: &str,
        season: Option<&str>,
        track_matches: bool,
    ) -> Result<Self> {
        let channel = channel.trim();
        if channel.is_empty() {
            anyhow::bail!("chat channel must be non-empty");
        }
        let players = parse_players(players);
        if players.is_empty() {
            anyhow::bail!("at least one player handle is required");
        }
        let season = season
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            channel: channel.to_string(),
            players,
            season,
            track_matches,
            aggregate_region: settings.aggregate_region.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            player_delay: Duration::from_millis(settings.player_delay_ms),
            status_interval: (settings.status_interval_secs > 0)
                .then(|| Duration::from_secs(settings.status_interval_secs)),
        })
    }

    pub fn season_rule(&self) -> SeasonRule {
        SeasonRule::from_config(self.season.as_deref())
    }
}

/// Split a comma-separated handle list, dropping blanks and repeats.
pub fn parse_players(raw: &str) -> Vec<String> {
    let mut players: Vec<String> = Vec::new();
    for handle in raw.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        if !players.iter().any(|p| p == handle) {
            players.push(handle.to_string());
        }
    }
    players
}
