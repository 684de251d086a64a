pub mod api;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod message;
pub mod monitor;
pub mod notifier;
pub mod reporter;
pub mod state;
pub mod types;

/// Tracker network profile API base URL (requires `TRN-Api-Key`)
pub const STATS_API_BASE: &str = "https://api.pubgtracker.com/v2";

/// Slack Web API base URL (bearer token auth)
pub const CHAT_API_BASE: &str = "https://slack.com/api";

/// Region tag the provider uses for stats aggregated across all regions
pub const AGGREGATE_REGION: &str = "agg";
