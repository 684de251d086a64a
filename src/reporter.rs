use crate::types::{DetectedEvent, ReportLine};

/// Emit a detected event as a single JSON line to stdout.
pub fn report_event(event: DetectedEvent) {
    let line = ReportLine {
        timestamp: chrono::Utc::now(),
        event,
    };
    if let Ok(json) = serde_json::to_string(&line) {
        println!("{json}");
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{ChangeEvent, CounterChange, DetectedEvent, ReportLine};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn report_line_is_tagged_and_flat() {
        let line = ReportLine {
            timestamp: Utc.with_ymd_and_hms(2017, 8, 1, 0, 0, 0).unwrap(),
            event: DetectedEvent::CounterIncrease(ChangeEvent {
                player: "shroud".to_string(),
                mode: "solo".to_string(),
                season: None,
                wins: Some(CounterChange {
                    delta: 1,
                    value: 11,
                    rank: None,
                }),
                kills: None,
            }),
        };
        let mut value = serde_json::to_value(&line).unwrap();
        let timestamp = value.as_object_mut().unwrap().remove("timestamp").unwrap();
        assert_eq!(
            serde_json::from_value::<DateTime<Utc>>(timestamp).unwrap(),
            line.timestamp
        );
        assert_eq!(
            value,
            json!({
                "kind": "counter_increase",
                "player": "shroud",
                "mode": "solo",
                "season": null,
                "wins": {"delta": 1, "value": 11, "rank": null},
                "kills": null
            })
        );
    }
}
