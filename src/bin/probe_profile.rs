//! Probe: fetch one raw profile document from the tracker API.
//!
//! Prints which region/season/mode entries the profile carries and which
//! stat field names appear, to check the live response shape against what
//! the extractor expects. Reads STATS_API_KEY from the environment and the
//! endpoint from the settings file (second argument, default `config.toml`).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::Value;

use pubg_stat_tracker::api::{API_KEY_HEADER, profile_url};
use pubg_stat_tracker::config::{AppConfig, CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let handle = args
        .next()
        .context("usage: probe_profile <player-handle> [config-path]")?;
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
    let api_key = std::env::var("STATS_API_KEY").context("STATS_API_KEY not set")?;

    let app_config = AppConfig::load_or_default(&config_path)?;
    let url = profile_url(&app_config.endpoints.stats_url()?, &handle);
    println!("=== Probe: profile {handle} ===");
    println!("URL: {url}");

    let client = reqwest::Client::builder()
        .timeout(app_config.request_timeout())
        .build()?;
    let start = Instant::now();
    let resp = client
        .get(url)
        .header(API_KEY_HEADER, api_key)
        .send()
        .await?;
    let latency = start.elapsed();
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Status: {status}");
    println!("Latency: {latency:?}");
    println!();

    if let Some(obj) = body.as_object() {
        println!("Top-level fields:");
        for key in obj.keys() {
            println!("  - {key}");
        }
        println!();
    }

    if let Some(err) = body.get("error") {
        println!("Provider error: {err}");
        return Ok(());
    }

    println!(
        "defaultSeason: {}",
        body.get("defaultSeason").unwrap_or(&Value::Null)
    );

    let entries = body
        .get("Stats")
        .or_else(|| body.get("stats"))
        .and_then(Value::as_array);
    let Some(entries) = entries else {
        println!("No Stats section.");
        return Ok(());
    };

    println!("{} stats entr(ies):", entries.len());
    let mut fields = BTreeSet::new();
    for entry in entries {
        let pick = |a: &str, b: &str| {
            entry
                .get(a)
                .or_else(|| entry.get(b))
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string()
        };
        println!(
            "  region={:<6} season={:<12} match={}",
            pick("Region", "region"),
            pick("Season", "season"),
            pick("Match", "match"),
        );
        if let Some(stats) = entry
            .get("Stats")
            .or_else(|| entry.get("stats"))
            .and_then(Value::as_array)
        {
            for stat in stats {
                if let Some(name) = stat.get("field").and_then(Value::as_str) {
                    fields.insert(name.to_string());
                }
            }
        }
    }

    println!();
    println!("Stat field names ({}):", fields.len());
    for name in &fields {
        println!("  - {name}");
    }

    let history = body
        .get("MatchHistory")
        .and_then(Value::as_array)
        .map(|a| a.len())
        .unwrap_or(0);
    println!();
    println!("MatchHistory entries: {history}");

    Ok(())
}
