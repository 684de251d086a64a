use thiserror::Error;
use tracing::debug;

use crate::types::{
    ChangeEvent, Counter, CounterChange, KILLS_FIELD, MatchEvent, ModeStats, PlayerSnapshot,
    WINS_FIELD,
};

/// Why a counter or mode produced no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeSkip {
    #[error("mode not present in previous snapshot")]
    NoBaseline,
    #[error("{0} missing on one side")]
    MissingCounter(&'static str),
    #[error("{0} is not numeric")]
    Malformed(&'static str),
    #[error("{field} did not increase ({old} -> {new})")]
    NoIncrease {
        field: &'static str,
        old: i64,
        new: i64,
    },
}

/// Compare two snapshots of the same player and describe every increase.
///
/// Modes absent from `old` are skipped. Decreases and malformed counters are
/// skipped for that mode only; the remaining modes are still evaluated.
pub fn diff(old: &PlayerSnapshot, new: &PlayerSnapshot, player: &str) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for (mode, new_stats) in &new.modes {
        let Some(old_stats) = old.modes.get(mode) else {
            debug!("[{player}] {mode}: {}", ModeSkip::NoBaseline);
            continue;
        };

        let wins = settle(player, mode, counter_change(WINS_FIELD, old_stats, new_stats));
        let kills = settle(player, mode, counter_change(KILLS_FIELD, old_stats, new_stats));
        if wins.is_none() && kills.is_none() {
            continue;
        }

        events.push(ChangeEvent {
            player: player.to_string(),
            mode: mode.clone(),
            season: new.season.clone(),
            wins,
            kills,
        });
    }
    events
}

/// Match-history entries newer than anything in `old`.
///
/// An empty `old` history is no baseline: nothing is reported.
pub fn new_matches(old: &PlayerSnapshot, new: &PlayerSnapshot, player: &str) -> Vec<MatchEvent> {
    if old.matches.is_empty() {
        debug!("[{player}] No previous match history to compare against");
        return Vec::new();
    }
    let max_id = old.latest_match_id();
    new.matches
        .iter()
        .filter(|m| m.id > max_id)
        .map(|m| MatchEvent {
            player: player.to_string(),
            summary: m.clone(),
        })
        .collect()
}

fn settle(
    player: &str,
    mode: &str,
    outcome: Result<CounterChange, ModeSkip>,
) -> Option<CounterChange> {
    match outcome {
        Ok(change) => Some(change),
        Err(skip) => {
            debug!("[{player}] {mode}: {skip}");
            None
        }
    }
}

fn counter_change(
    field: &'static str,
    old: &ModeStats,
    new: &ModeStats,
) -> Result<CounterChange, ModeSkip> {
    let (old, new) = match (select(field, old), select(field, new)) {
        (Some(o), Some(n)) => (o, n),
        _ => return Err(ModeSkip::MissingCounter(field)),
    };
    let (Some(old_value), Some(new_value)) = (old.value, new.value) else {
        return Err(ModeSkip::Malformed(field));
    };

    let delta = new_value.saturating_sub(old_value);
    if delta <= 0 {
        return Err(ModeSkip::NoIncrease {
            field,
            old: old_value,
            new: new_value,
        });
    }

    Ok(CounterChange {
        delta: delta.unsigned_abs(),
        value: new_value,
        rank: new.rank,
    })
}

fn select<'a>(field: &str, stats: &'a ModeStats) -> Option<&'a Counter> {
    match field {
        WINS_FIELD => stats.wins.as_ref(),
        KILLS_FIELD => stats.kills.as_ref(),
        _ => None,
    }
}
