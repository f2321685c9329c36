//! Normalizes Graph API insight records into the same metrics contract the
//! stored documents produce.
//!
//! Graph encodes counters as strings (`"spend": "12.34"`) and reports results
//! as an `actions` list keyed by `action_type`.

use crate::constants::RESULT_ACTION_TYPES;
use crate::stats::{cpc, cpm, ctr, round2};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightMetrics {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub reach: u64,
    pub results: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
}

impl InsightMetrics {
    pub fn from_graph(record: &Value) -> Self {
        let spend = number(record, "spend");
        let impressions = count(record, "impressions");
        let clicks = count(record, "clicks");
        Self {
            spend: round2(spend),
            impressions,
            clicks,
            reach: count(record, "reach"),
            results: results(record),
            ctr: ctr(impressions, clicks),
            cpc: cpc(spend, clicks),
            cpm: cpm(spend, impressions),
        }
    }
}

/// Copies the record's dimension fields (everything that is not a counter)
/// and replaces the counters with normalized metrics.
pub fn normalize_row(record: &Value) -> Value {
    const COUNTERS: &[&str] = &[
        "spend",
        "impressions",
        "clicks",
        "reach",
        "ctr",
        "cpc",
        "cpm",
        "actions",
    ];

    let mut row = Map::new();
    if let Some(fields) = record.as_object() {
        for (key, value) in fields {
            if !COUNTERS.contains(&key.as_str()) {
                row.insert(key.clone(), value.clone());
            }
        }
    }
    if let Ok(Value::Object(metrics)) = serde_json::to_value(InsightMetrics::from_graph(record)) {
        row.extend(metrics);
    }
    Value::Object(row)
}

fn number(record: &Value, key: &str) -> f64 {
    let value = match record.get(key) {
        Some(Value::String(text)) => text.parse::<f64>().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };
    value.max(0.0)
}

fn count(record: &Value, key: &str) -> u64 {
    number(record, key).round() as u64
}

/// First action type present, in [`RESULT_ACTION_TYPES`] priority order.
fn results(record: &Value) -> u64 {
    let Some(actions) = record.get("actions").and_then(Value::as_array) else {
        return 0;
    };

    RESULT_ACTION_TYPES
        .iter()
        .find_map(|wanted| {
            actions
                .iter()
                .find(|action| action.get("action_type").and_then(Value::as_str) == Some(*wanted))
        })
        .map(|action| count(action, "value"))
        .unwrap_or(0)
}
