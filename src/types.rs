use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Player handle as supplied on the command line.
pub type PlayerHandle = String;

/// Game mode identifier (e.g. "solo", "duo-fpp").
pub type ModeKey = String;

/// Counter field names retained from the provider document.
pub const WINS_FIELD: &str = "Wins";
pub const KILLS_FIELD: &str = "Kills";

/// A single tracked counter as last reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counter {
    /// `None` when the provider sent the field but no usable integer.
    pub value: Option<i64>,
    pub rank: Option<u64>,
}

impl Counter {
    pub fn new(value: i64) -> Self {
        Self {
            value: Some(value),
            rank: None,
        }
    }

    pub fn with_rank(value: i64, rank: u64) -> Self {
        Self {
            value: Some(value),
            rank: Some(rank),
        }
    }

    pub fn malformed() -> Self {
        Self {
            value: None,
            rank: None,
        }
    }
}

/// Tracked counters for one game mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeStats {
    pub wins: Option<Counter>,
    pub kills: Option<Counter>,
}

/// Summary of one entry from the provider's match history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub id: u64,
    pub season: String,
    pub mode: String,
    pub wins: i64,
    pub kills: i64,
    pub top10: i64,
    pub rating: f64,
}

/// Last observed aggregate statistics for one player.
///
/// Replaced wholesale after every poll that returns usable data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Season the aggregate entries were selected for, if any.
    pub season: Option<String>,
    pub modes: BTreeMap<ModeKey, ModeStats>,
    /// Empty unless match tracking is enabled.
    pub matches: Vec<MatchSummary>,
}

impl PlayerSnapshot {
    /// Highest match id seen in this snapshot, or 0 when there is no history.
    pub fn latest_match_id(&self) -> u64 {
        self.matches.iter().map(|m| m.id).max().unwrap_or(0)
    }
}

/// Increase of one counter between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterChange {
    pub delta: u64,
    pub value: i64,
    pub rank: Option<u64>,
}

/// One detected increase for a player/mode. At least one of `wins`/`kills` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub player: PlayerHandle,
    pub mode: ModeKey,
    pub season: Option<String>,
    pub wins: Option<CounterChange>,
    pub kills: Option<CounterChange>,
}

/// A match-history entry that was not present in the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub player: PlayerHandle,
    #[serde(flatten)]
    pub summary: MatchSummary,
}

/// Everything a poll cycle detected, tagged for the stdout audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectedEvent {
    CounterIncrease(ChangeEvent),
    NewMatch(MatchEvent),
}

/// Audit record written by the reporter.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DetectedEvent,
}
