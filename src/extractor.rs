use std::collections::btree_map::Entry;

use serde_json::Value;
use tracing::debug;

use crate::api::{MatchRecord, ProfileDocument, RegionStats, StatField};
use crate::types::{Counter, KILLS_FIELD, MatchSummary, ModeStats, PlayerSnapshot, WINS_FIELD};

/// Which season's aggregate entries to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonRule {
    /// Only entries tagged with this season.
    Explicit(String),
    /// The document's `defaultSeason` if it names one, otherwise any season.
    DocumentDefault,
}

impl SeasonRule {
    pub fn from_config(season: Option<&str>) -> Self {
        match season {
            Some(s) => Self::Explicit(s.to_string()),
            None => Self::DocumentDefault,
        }
    }

    fn resolve(&self, doc: &ProfileDocument) -> Option<String> {
        match self {
            Self::Explicit(s) => Some(s.clone()),
            Self::DocumentDefault => doc.default_season.clone(),
        }
    }
}

/// Projects raw profile documents down to the tracked counters.
#[derive(Debug, Clone)]
pub struct StatsExtractor {
    aggregate_region: String,
    season_rule: SeasonRule,
    track_matches: bool,
}

impl StatsExtractor {
    pub fn new(aggregate_region: &str, season_rule: SeasonRule, track_matches: bool) -> Self {
        Self {
            aggregate_region: aggregate_region.to_string(),
            season_rule,
            track_matches,
        }
    }

    /// Build a snapshot from a profile document.
    ///
    /// Returns `None` when the document has no `Stats` section or no
    /// aggregate entry matches the season rule. Unrecognized fields are dropped.
    pub fn extract(&self, doc: &ProfileDocument) -> Option<PlayerSnapshot> {
        let entries = doc.stats.as_ref()?;
        let season = self.season_rule.resolve(doc);

        let mut snapshot = PlayerSnapshot {
            season: season.clone(),
            ..Default::default()
        };
        let mut matched = false;

        for raw in entries {
            let entry: RegionStats = match serde_json::from_value(raw.clone()) {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unparseable stats entry: {e}");
                    continue;
                }
            };
            if entry.region != self.aggregate_region {
                continue;
            }
            if let Some(want) = &season {
                if entry.season.as_deref() != Some(want.as_str()) {
                    continue;
                }
            }
            matched = true;

            match snapshot.modes.entry(entry.mode.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(project_fields(&entry.fields));
                }
                Entry::Occupied(_) => {
                    debug!(
                        "Ignoring duplicate aggregate entry for mode {} (season {:?})",
                        entry.mode, entry.season
                    );
                }
            }
        }

        if !matched {
            return None;
        }

        if self.track_matches {
            snapshot.matches = extract_matches(doc.match_history.as_deref().unwrap_or_default());
        }

        Some(snapshot)
    }
}

/// Keep only the recognized counters of one region entry.
fn project_fields(fields: &[StatField]) -> ModeStats {
    let mut stats = ModeStats::default();
    for field in fields {
        match field.field.as_str() {
            WINS_FIELD => stats.wins = Some(to_counter(field)),
            KILLS_FIELD => stats.kills = Some(to_counter(field)),
            _ => {}
        }
    }
    stats
}

fn to_counter(field: &StatField) -> Counter {
    let value = field
        .value_int
        .as_ref()
        .and_then(as_integer)
        .or_else(|| field.value.as_ref().and_then(as_integer));
    let rank = field.rank.as_ref().and_then(as_rank);
    Counter { value, rank }
}

/// Accepts JSON integers and integer-valued strings ("13", "1,024").
fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn as_rank(v: &Value) -> Option<u64> {
    as_integer(v).and_then(|r| u64::try_from(r).ok())
}

fn extract_matches(raw: &[Value]) -> Vec<MatchSummary> {
    raw.iter()
        .filter_map(|v| match serde_json::from_value::<MatchRecord>(v.clone()) {
            Ok(m) => Some(MatchSummary {
                id: m.id,
                season: m.season_display,
                mode: m.match_display,
                wins: m.wins,
                kills: m.kills,
                top10: m.top10,
                rating: m.rating,
            }),
            Err(e) => {
                debug!("Skipping unparseable match history entry: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> ProfileDocument {
        serde_json::from_value(value).expect("valid test profile JSON")
    }

    fn extractor(rule: SeasonRule) -> StatsExtractor {
        StatsExtractor::new("agg", rule, false)
    }

    fn sample() -> ProfileDocument {
        doc(json!({
            "defaultSeason": "2017-pre4",
            "Stats": [
                {
                    "Region": "agg", "Season": "2017-pre4", "Match": "solo",
                    "Stats": [
                        {"field": "Wins", "ValueInt": 10, "rank": 512},
                        {"field": "Kills", "ValueInt": 240, "rank": 900},
                        {"field": "Top10s", "ValueInt": 55}
                    ]
                },
                {
                    "Region": "na", "Season": "2017-pre4", "Match": "solo",
                    "Stats": [{"field": "Wins", "ValueInt": 7}]
                },
                {
                    "Region": "agg", "Season": "2017-pre3", "Match": "duo",
                    "Stats": [{"field": "Wins", "ValueInt": 99}]
                },
                {
                    "Region": "agg", "Season": "2017-pre4", "Match": "squad",
                    "Stats": [{"field": "Wins", "ValueInt": 2}]
                }
            ]
        }))
    }

    // ── selection ──────────────────────────────────────────────────

    #[test]
    fn default_season_selects_aggregate_entries() {
        let snap = extractor(SeasonRule::DocumentDefault)
            .extract(&sample())
            .unwrap();
        assert_eq!(snap.season.as_deref(), Some("2017-pre4"));
        assert_eq!(snap.modes.len(), 2);
        let solo = &snap.modes["solo"];
        assert_eq!(solo.wins, Some(Counter::with_rank(10, 512)));
        assert_eq!(solo.kills, Some(Counter::with_rank(240, 900)));
        assert_eq!(snap.modes["squad"].wins, Some(Counter::new(2)));
        assert!(snap.modes["squad"].kills.is_none());
    }

    #[test]
    fn explicit_season_overrides_document_default() {
        let snap = extractor(SeasonRule::Explicit("2017-pre3".into()))
            .extract(&sample())
            .unwrap();
        assert_eq!(snap.modes.len(), 1);
        assert_eq!(snap.modes["duo"].wins, Some(Counter::new(99)));
    }

    #[test]
    fn no_season_anywhere_keeps_first_entry_per_mode() {
        let d = doc(json!({
            "Stats": [
                {"Region": "agg", "Season": "s2", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 5}]},
                {"Region": "agg", "Season": "s1", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 1}]}
            ]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert!(snap.season.is_none());
        assert_eq!(snap.modes["solo"].wins, Some(Counter::new(5)));
    }

    #[test]
    fn custom_aggregate_region() {
        let d = doc(json!({
            "Stats": [{"Region": "all", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 3}]}]
        }));
        assert!(extractor(SeasonRule::DocumentDefault).extract(&d).is_none());
        let snap = StatsExtractor::new("all", SeasonRule::DocumentDefault, false)
            .extract(&d)
            .unwrap();
        assert_eq!(snap.modes["solo"].wins, Some(Counter::new(3)));
    }

    // ── absent ─────────────────────────────────────────────────────

    #[test]
    fn missing_stats_section_is_absent() {
        let d = doc(json!({"PlayerName": "ghost"}));
        assert!(extractor(SeasonRule::DocumentDefault).extract(&d).is_none());
    }

    #[test]
    fn no_matching_aggregate_entry_is_absent() {
        let snap = extractor(SeasonRule::Explicit("2016".into())).extract(&sample());
        assert!(snap.is_none());
    }

    #[test]
    fn aggregate_entry_without_counters_is_present_but_empty() {
        let d = doc(json!({
            "Stats": [{"Region": "agg", "Match": "solo", "Stats": [{"field": "Rating", "ValueInt": 1500}]}]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert_eq!(snap.modes["solo"], ModeStats::default());
    }

    // ── field parsing ──────────────────────────────────────────────

    #[test]
    fn field_names_are_case_sensitive() {
        let d = doc(json!({
            "Stats": [{"Region": "agg", "Match": "solo", "Stats": [
                {"field": "wins", "ValueInt": 4},
                {"field": "KILLS", "ValueInt": 8}
            ]}]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert_eq!(snap.modes["solo"], ModeStats::default());
    }

    #[test]
    fn value_string_fallback_and_malformed_counter() {
        let d = doc(json!({
            "Stats": [
                {"Region": "agg", "Match": "solo", "Stats": [{"field": "Wins", "value": "1,024"}]},
                {"Region": "agg", "Match": "duo", "Stats": [{"field": "Wins", "ValueInt": "lots"}]}
            ]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert_eq!(snap.modes["solo"].wins, Some(Counter::new(1024)));
        assert_eq!(snap.modes["duo"].wins, Some(Counter::malformed()));
    }

    #[test]
    fn unparseable_entry_does_not_reject_document() {
        let d = doc(json!({
            "Stats": [
                {"Region": "agg"},
                {"Region": "agg", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 6}]}
            ]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert_eq!(snap.modes.len(), 1);
        assert_eq!(snap.modes["solo"].wins, Some(Counter::new(6)));
    }

    #[test]
    fn negative_rank_is_dropped() {
        let d = doc(json!({
            "Stats": [{"Region": "agg", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 6, "rank": -1}]}]
        }));
        let snap = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert_eq!(snap.modes["solo"].wins, Some(Counter::new(6)));
    }

    // ── match history ──────────────────────────────────────────────

    #[test]
    fn match_history_only_when_tracking() {
        let d = doc(json!({
            "Stats": [{"Region": "agg", "Match": "solo", "Stats": [{"field": "Wins", "ValueInt": 1}]}],
            "MatchHistory": [
                {"Id": 42, "SeasonDisplay": "Early Access Season #4", "MatchDisplay": "Solo",
                 "Wins": 1, "Kills": 6, "Top10": 1, "Rating": 1612.5},
                {"Id": "not-a-number"}
            ]
        }));
        let plain = extractor(SeasonRule::DocumentDefault).extract(&d).unwrap();
        assert!(plain.matches.is_empty());

        let tracked = StatsExtractor::new("agg", SeasonRule::DocumentDefault, true)
            .extract(&d)
            .unwrap();
        assert_eq!(tracked.matches.len(), 1);
        assert_eq!(tracked.matches[0].id, 42);
        assert_eq!(tracked.matches[0].mode, "Solo");
        assert_eq!(tracked.matches[0].kills, 6);
        assert_eq!(tracked.latest_match_id(), 42);
    }
}
