//! Chat message rendering.

use std::fmt::Write;

use crate::types::{ChangeEvent, MatchEvent, PlayerSnapshot};

const UNKNOWN: &str = "n/a";

/// Banner posted once the initial snapshots are collected.
pub fn startup_banner(players: &[String]) -> String {
    format!("Starting to monitor...\nPlayers: {}", players.join(","))
}

/// Header of the periodic status report.
pub fn status_header() -> String {
    "Stat tracker is running. Current stats for all monitored players below.".to_string()
}

pub fn change(event: &ChangeEvent) -> String {
    let season = event.season.as_deref().unwrap_or(UNKNOWN);
    let mut text = String::new();

    match (&event.wins, &event.kills) {
        (Some(wins), kills) => {
            let _ = writeln!(
                text,
                "{} new win(s) detected for player {}!",
                wins.delta, event.player
            );
            let _ = writeln!(text, "Season: {season}");
            let _ = writeln!(text, "Mode: {}", event.mode);
            let _ = writeln!(text, "Win Count: {}", wins.value);
            let _ = write!(text, "Latest Rank: {}", display_rank(wins.rank));
            if let Some(kills) = kills {
                let _ = write!(text, "\nKills: {} (+{})", kills.value, kills.delta);
            }
        }
        (None, Some(kills)) => {
            let _ = writeln!(
                text,
                "{} new kill(s) detected for player {}!",
                kills.delta, event.player
            );
            let _ = writeln!(text, "Season: {season}");
            let _ = writeln!(text, "Mode: {}", event.mode);
            let _ = writeln!(text, "Kill Count: {}", kills.value);
            let _ = write!(text, "Latest Rank: {}", display_rank(kills.rank));
        }
        (None, None) => {}
    }
    text
}

pub fn new_match(event: &MatchEvent) -> String {
    let m = &event.summary;
    format!(
        "New match history detected for player {}!\n\
         Season: {}\n\
         Mode: {}\n\
         Win Count: {}\n\
         Kills: {}\n\
         Top10: {}\n\
         Mode Rating: {:.1}",
        event.player, m.season, m.mode, m.wins, m.kills, m.top10, m.rating
    )
}

/// Per-player block of the periodic status report.
pub fn player_status(player: &str, snapshot: &PlayerSnapshot) -> String {
    let mut text = format!(
        "Player: {player}\nSeason: {}",
        snapshot.season.as_deref().unwrap_or(UNKNOWN)
    );
    if snapshot.modes.is_empty() {
        text.push_str("\nNo tracked stats");
        return text;
    }
    for (mode, stats) in &snapshot.modes {
        let wins = stats.wins.as_ref().and_then(|c| c.value);
        let kills = stats.kills.as_ref().and_then(|c| c.value);
        let _ = write!(
            text,
            "\n{mode}: wins {} | kills {}",
            display_value(wins),
            display_value(kills)
        );
    }
    text
}

fn display_rank(rank: Option<u64>) -> String {
    rank.map_or_else(|| UNKNOWN.to_string(), |r| r.to_string())
}

fn display_value(value: Option<i64>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}
