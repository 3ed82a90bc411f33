//! Flattening of per-ticker results into one row per bar, and exact-duplicate
//! elimination.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::orchestrator::{FetchOutcome, FetchStatus};
use crate::{EnrichedBar, ExchangeDateTime, Outcome, ResponseMetadata, UtcDateTime};

/// One persisted row: a bar joined with its response metadata and the
/// run-level fields of the fetch that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "vw")]
    pub vwap: Option<f64>,
    #[serde(rename = "n")]
    pub transactions: Option<u64>,
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    pub utc_instant: UtcDateTime,
    pub exchange_time: ExchangeDateTime,
    pub outcome: Outcome,

    pub ticker: String,
    pub response_status: String,
    pub adjusted: Option<bool>,
    pub count: Option<u64>,
    #[serde(rename = "queryCount")]
    pub query_count: Option<u64>,
    #[serde(rename = "resultsCount")]
    pub results_count: Option<u64>,
    pub request_id: Option<String>,

    pub status: FetchStatus,
    pub url: String,
    pub start_time: UtcDateTime,
    pub duration_ms: u64,
}

impl FlatRow {
    pub fn new(bar: &EnrichedBar, metadata: &ResponseMetadata, outcome: &FetchOutcome) -> Self {
        let raw = &bar.raw;
        Self {
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            vwap: raw.vwap,
            transactions: raw.transactions,
            timestamp_ms: raw.timestamp_ms,
            utc_instant: bar.utc_instant,
            exchange_time: bar.exchange_time,
            outcome: bar.outcome,
            ticker: metadata.ticker.clone(),
            response_status: metadata.status.clone(),
            adjusted: metadata.adjusted,
            count: metadata.count,
            query_count: metadata.query_count,
            results_count: metadata.results_count,
            request_id: metadata.request_id.clone(),
            status: outcome.status(),
            url: outcome.url.clone(),
            start_time: outcome.start_time,
            duration_ms: outcome.duration_ms(),
        }
    }
}

/// One row per bar of every successful outcome. Failed outcomes carry no
/// bars and contribute nothing.
pub fn flatten(outcomes: &[FetchOutcome]) -> Vec<FlatRow> {
    outcomes
        .iter()
        .filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .ok()
                .map(|payload| (outcome, payload))
        })
        .flat_map(|(outcome, payload)| {
            payload
                .bars
                .iter()
                .map(move |bar| FlatRow::new(bar, &payload.metadata, outcome))
        })
        .collect()
}

/// Drop rows identical to an earlier row in every column, keeping the first
/// occurrence in place.
pub fn dedup(rows: Vec<FlatRow>) -> Result<Vec<FlatRow>, PersistenceError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut unique = Vec::with_capacity(rows.len());

    for row in rows {
        if seen.insert(serde_json::to_string(&row)?) {
            unique.push(row);
        }
    }

    Ok(unique)
}

/// [`flatten`] followed by [`dedup`].
pub fn flatten_dedup(outcomes: &[FetchOutcome]) -> Result<Vec<FlatRow>, PersistenceError> {
    dedup(flatten(outcomes))
}
