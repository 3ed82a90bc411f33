use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{ExchangeDateTime, UtcDateTime};

/// One aggregate bar exactly as the aggregates endpoint returns it.
///
/// `o`, `h`, `l`, `c`, `v` and `t` are required; `vw` and `n` are omitted by
/// the upstream for some bars and stay optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
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
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    #[serde(rename = "n", default)]
    pub transactions: Option<u64>,
    /// Start of the aggregate window, milliseconds since the Unix epoch.
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
}

/// Per-ticker envelope fields returned alongside the bars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub ticker: String,
    pub status: String,
    #[serde(default)]
    pub adjusted: Option<bool>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(rename = "queryCount", default)]
    pub query_count: Option<u64>,
    #[serde(rename = "resultsCount", default)]
    pub results_count: Option<u64>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Signal derived from a bar and its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Bull,
    Bear,
    Neutral,
    /// First bar of a sequence; there is nothing to compare against.
    Undefined,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Bear => "bear",
            Self::Neutral => "neutral",
            Self::Undefined => "undefined",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bar plus its converted timestamps and derived outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub raw: RawBar,
    pub utc_instant: UtcDateTime,
    pub exchange_time: ExchangeDateTime,
    pub outcome: Outcome,
}
