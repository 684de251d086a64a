use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Header the tracker API reads the static API key from (`TRN-Api-Key`).
pub const API_KEY_HEADER: &str = "trn-api-key";

/// Why a profile could not be fetched this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed profile body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("provider rejected lookup: {0}")]
    Provider(String),
}

/// Source of raw per-player statistics documents.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch(&self, handle: &str) -> Result<ProfileDocument, FetchError>;
}

/// Raw profile document as returned by the tracker API.
///
/// `Stats` entries are kept untyped here so one bad entry can be skipped
/// without rejecting the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileDocument {
    #[serde(rename = "PlayerName", default)]
    pub player_name: Option<String>,
    #[serde(rename = "defaultSeason", alias = "default_season", default)]
    pub default_season: Option<String>,
    #[serde(rename = "Stats", alias = "stats", default)]
    pub stats: Option<Vec<Value>>,
    #[serde(rename = "MatchHistory", default)]
    pub match_history: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One region/season/mode entry of the `Stats` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionStats {
    #[serde(rename = "Region", alias = "region")]
    pub region: String,
    #[serde(rename = "Season", alias = "season", default)]
    pub season: Option<String>,
    #[serde(rename = "Match", alias = "match")]
    pub mode: String,
    #[serde(rename = "Stats", alias = "stats", default)]
    pub fields: Vec<StatField>,
}

/// One named stat inside a region entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StatField {
    pub field: String,
    #[serde(rename = "ValueInt", default)]
    pub value_int: Option<Value>,
    /// Display string, e.g. "13".
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub rank: Option<Value>,
}

/// One entry of the `MatchHistory` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "SeasonDisplay", default)]
    pub season_display: String,
    #[serde(rename = "MatchDisplay", default)]
    pub match_display: String,
    #[serde(rename = "Wins", default)]
    pub wins: i64,
    #[serde(rename = "Kills", default)]
    pub kills: i64,
    #[serde(rename = "Top10", default)]
    pub top10: i64,
    #[serde(rename = "Rating", default)]
    pub rating: f64,
}

/// HTTP client for the tracker profile endpoint.
pub struct TrackerClient {
    client: reqwest::Client,
    base_url: Url,
}

impl TrackerClient {
    pub fn new(base_url: &Url, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("stats API base {base_url} cannot carry a path");
        }

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| anyhow::anyhow!("stats API key contains invalid header characters"))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.clone(),
        })
    }

}

/// Profile endpoint for `handle` below `base`, with the handle percent-encoded.
pub fn profile_url(base: &Url, handle: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["profile", "pc", handle]);
    }
    url
}

#[async_trait]
impl StatsProvider for TrackerClient {
    async fn fetch(&self, handle: &str) -> Result<ProfileDocument, FetchError> {
        let url = profile_url(&self.base_url, handle);
        debug!("Fetching profile {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::Transport)?;
        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        parse_profile(&body)
    }
}

/// Decode a profile body, surfacing an embedded `error` field as a failure.
pub fn parse_profile(body: &str) -> Result<ProfileDocument, FetchError> {
    let doc: ProfileDocument = serde_json::from_str(body).map_err(FetchError::Decode)?;
    if let Some(err) = &doc.error {
        return Err(FetchError::Provider(err.clone()));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_profile_keeps_untyped_entries() {
        let doc = parse_profile(
            r#"{
                "PlayerName": "shroud",
                "defaultSeason": "2017-pre4",
                "Stats": [
                    {"Region": "agg", "Season": "2017-pre4", "Match": "solo", "Stats": []},
                    {"garbage": true}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.player_name.as_deref(), Some("shroud"));
        assert_eq!(doc.default_season.as_deref(), Some("2017-pre4"));
        assert_eq!(doc.stats.unwrap().len(), 2);
        assert!(doc.match_history.is_none());
    }

    #[test]
    fn parse_profile_provider_error() {
        let err = parse_profile(r#"{"error": "Player not found"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Provider(ref msg) if msg == "Player not found"));
    }

    #[test]
    fn parse_profile_rejects_non_json() {
        let err = parse_profile("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn region_stats_accepts_lowercase_aliases() {
        let entry: RegionStats = serde_json::from_value(serde_json::json!({
            "region": "agg",
            "match": "duo",
            "stats": [{"field": "Wins", "ValueInt": 4}]
        }))
        .unwrap();
        assert_eq!(entry.region, "agg");
        assert_eq!(entry.mode, "duo");
        assert!(entry.season.is_none());
        assert_eq!(entry.fields.len(), 1);
    }

    #[test]
    fn profile_url_trims_trailing_slash() {
        let base = Url::parse("https://example.test/v2/").unwrap();
        assert_eq!(
            profile_url(&base, "shroud").as_str(),
            "https://example.test/v2/profile/pc/shroud"
        );
    }

    #[test]
    fn profile_url_encodes_handle() {
        let base = Url::parse("https://example.test/v2").unwrap();
        assert_eq!(
            profile_url(&base, "dr disrespect").as_str(),
            "https://example.test/v2/profile/pc/dr%20disrespect"
        );
        assert_eq!(
            profile_url(&base, "a/b?c").as_str(),
            "https://example.test/v2/profile/pc/a%2Fb%3Fc"
        );
    }

    #[test]
    fn client_rejects_non_path_base() {
        let base = Url::parse("mailto:someone@example.test").unwrap();
        assert!(TrackerClient::new(&base, "key", Duration::from_secs(1)).is_err());
    }
}
