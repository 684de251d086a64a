use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pubg_stat_tracker::api::TrackerClient;
use pubg_stat_tracker::config::{AppConfig, CONFIG_PATH, MonitorConfig};
use pubg_stat_tracker::monitor::Monitor;
use pubg_stat_tracker::notifier::SlackNotifier;

#[derive(Parser)]
#[command(name = "stat-tracker", about = "Posts new PUBG wins of tracked players to Slack")]
struct Args {
    /// Tracker network API key
    #[arg(short = 'p', long, env = "STATS_API_KEY", hide_env_values = true)]
    stats_api_key: String,

    /// Slack bot token
    #[arg(short = 's', long, env = "SLACK_TOKEN", hide_env_values = true)]
    slack_token: String,

    /// Slack channel to post to
    #[arg(short = 'c', long, env = "SLACK_CHANNEL")]
    slack_channel: String,

    /// Comma-separated player handles to monitor
    #[arg(short = 'm', long, env = "PLAYERS_MONITORED")]
    players: String,

    /// Season to track (defaults to the provider's current season)
    #[arg(long, env = "STATS_SEASON")]
    season: Option<String>,

    /// Also announce new match-history entries
    #[arg(long)]
    track_matches: bool,

    /// Settings file (missing file means defaults)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let app_config = AppConfig::load_or_default(&args.config)?;
    let config = MonitorConfig::new(
        &app_config.settings,
        &args.slack_channel,
        &args.players,
        args.season.as_deref(),
        args.track_matches,
    )?;

    let timeout = app_config.request_timeout();
    let provider = TrackerClient::new(
        &app_config.endpoints.stats_url()?,
        &args.stats_api_key,
        timeout,
    )?;
    let notifier = SlackNotifier::new(&app_config.endpoints.chat_url()?, &args.slack_token, timeout)?;

    info!(
        "Starting stat tracker: players={} channel={} season={} poll={}s",
        config.players.join(","),
        config.channel,
        config.season.as_deref().unwrap_or("provider default"),
        config.poll_interval.as_secs(),
    );

    let mut monitor = Monitor::new(config, provider, notifier);
    monitor
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
