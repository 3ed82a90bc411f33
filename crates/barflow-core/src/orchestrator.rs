//! Sequential run over a ticker list with per-ticker failure isolation.
//!
//! Every ticker yields exactly one [`FetchOutcome`], in input order. A
//! ticker's failure is carried as the `Err` side of its outcome's `result`
//! and never stops the remaining tickers.

use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::enrich::enrich;
use crate::error::TickerError;
use crate::polygon::{parse_aggregates, redact_api_key, PolygonClient};
use crate::{AggregatesQuery, EnrichedBar, ResponseMetadata, Ticker, TickerRequest, UtcDateTime};

/// Final state of one ticker's fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Error,
}

impl FetchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl Display for FetchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded and enriched response for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerPayload {
    pub metadata: ResponseMetadata,
    pub bars: Vec<EnrichedBar>,
}

/// Outcome of one ticker within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub ticker: Ticker,
    /// Request URL with the api key redacted.
    pub url: String,
    pub start_time: UtcDateTime,
    pub duration: Duration,
    pub result: Result<TickerPayload, TickerError>,
}

impl FetchOutcome {
    pub fn status(&self) -> FetchStatus {
        if self.result.is_ok() {
            FetchStatus::Success
        } else {
            FetchStatus::Error
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn bar_count(&self) -> usize {
        self.result.as_ref().map_or(0, |payload| payload.bars.len())
    }
}

/// All outcomes of a run, in ticker input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn total_bars(&self) -> usize {
        self.outcomes.iter().map(FetchOutcome::bar_count).sum()
    }

    pub fn outcome(&self, ticker: &str) -> Option<&FetchOutcome> {
        self.outcomes.iter().find(|o| o.ticker.as_str() == ticker)
    }
}

/// Drives the fetch client over a ticker list, one ticker at a time.
#[derive(Clone)]
pub struct Orchestrator {
    client: PolygonClient,
}

impl Orchestrator {
    pub fn new(client: PolygonClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PolygonClient {
        &self.client
    }

    pub async fn run(&self, tickers: &[Ticker], query: &AggregatesQuery) -> RunReport {
        let names: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        info!(tickers = ?names, "fetching data for tickers");

        let mut outcomes = Vec::with_capacity(tickers.len());
        for (index, ticker) in tickers.iter().enumerate() {
            let request = TickerRequest::new(ticker.clone(), *query);
            let url = self.client.build_url(&request);
            let redacted = redact_api_key(&url);
            if index == 0 {
                info!(ticker = %ticker, url = %redacted, "first URL to be processed");
            }

            let start_time = UtcDateTime::now();
            let started = Instant::now();
            let result = self.process(&url).await;
            let duration = started.elapsed();

            match &result {
                Ok(payload) => debug!(
                    ticker = %ticker,
                    bars = payload.bars.len(),
                    duration_ms = duration.as_millis(),
                    "ticker fetched"
                ),
                Err(cause) => error!(ticker = %ticker, error = %cause, "error fetching data"),
            }

            outcomes.push(FetchOutcome {
                ticker: ticker.clone(),
                url: redacted,
                start_time,
                duration,
                result,
            });
        }

        let report = RunReport { outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            bars = report.total_bars(),
            "run finished"
        );
        report
    }

    async fn process(&self, url: &str) -> Result<TickerPayload, TickerError> {
        let body = self.client.fetch_json(url).await?;
        let (metadata, raw_bars) = parse_aggregates(body)?;
        let bars = enrich(raw_bars)?;
        Ok(TickerPayload { metadata, bars })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::{FetchError, SchemaError};
    use crate::http_client::{HttpError, HttpResponse, ScriptedHttpClient};
    use crate::retry::{Backoff, RetryConfig};
    use crate::{parse_date, Outcome};

    fn body(ticker: &str, bars: serde_json::Value) -> HttpResponse {
        HttpResponse::ok_json(
            json!({
                "ticker": ticker,
                "status": "OK",
                "adjusted": false,
                "queryCount": 2,
                "resultsCount": 2,
                "request_id": "r1",
                "results": bars
            })
            .to_string(),
        )
    }

    fn orchestrator(http: Arc<ScriptedHttpClient>) -> Orchestrator {
        Orchestrator::new(
            PolygonClient::with_http_client("https://api.test", "secret", http)
                .with_retry(RetryConfig::new(2).with_backoff(Backoff::immediate())),
        )
    }

    fn query() -> AggregatesQuery {
        AggregatesQuery::new(
            parse_date("2025-01-01").expect("valid"),
            parse_date("2025-01-03").expect("valid"),
        )
    }

    fn tickers(names: &[&str]) -> Vec<Ticker> {
        names
            .iter()
            .map(|name| Ticker::parse(name).expect("valid"))
            .collect()
    }

    #[tokio::test]
    async fn one_outcome_per_ticker_in_input_order() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .route("/GOOGL/", vec![Ok(body("GOOGL", json!([])))])
                .route("/AAPL/", vec![Ok(body("AAPL", json!([])))])
                .route("/MSFT/", vec![Err(HttpError::new("down"))]),
        );

        let report = orchestrator(http)
            .run(&tickers(&["MSFT", "AAPL", "GOOGL"]), &query())
            .await;

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(order, ["MSFT", "AAPL", "GOOGL"]);
        let statuses: Vec<FetchStatus> = report.outcomes.iter().map(FetchOutcome::status).collect();
        assert_eq!(
            statuses,
            [FetchStatus::Error, FetchStatus::Success, FetchStatus::Success]
        );
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn schema_failure_is_contained_to_its_ticker() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .route(
                    "/AAPL/",
                    vec![Ok(HttpResponse::ok_json(r#"{"ticker":"AAPL","status":"OK"}"#))],
                )
                .route(
                    "/MSFT/",
                    vec![Ok(body(
                        "MSFT",
                        json!([{"o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10, "t": 1735794000000_i64}]),
                    ))],
                ),
        );

        let report = orchestrator(http).run(&tickers(&["AAPL", "MSFT"]), &query()).await;

        let aapl = report.outcome("AAPL").expect("present");
        assert_eq!(aapl.result, Err(TickerError::Schema(SchemaError::MissingResults)));
        let msft = report.outcome("MSFT").expect("present");
        assert_eq!(msft.bar_count(), 1);
        assert_eq!(
            msft.result.as_ref().map(|p| p.bars[0].outcome),
            Ok(Outcome::Undefined)
        );
    }

    #[tokio::test]
    async fn stored_url_never_contains_the_api_key() {
        let http = Arc::new(ScriptedHttpClient::new().route("/AAPL/", vec![Err(HttpError::new("down"))]));

        let report = orchestrator(Arc::clone(&http))
            .run(&tickers(&["AAPL"]), &query())
            .await;

        let outcome = &report.outcomes[0];
        assert!(!outcome.url.contains("secret"));
        assert!(outcome.url.contains("apiKey=REDACTED"));
        assert!(matches!(
            outcome.result,
            Err(TickerError::Fetch(FetchError::MaxRetriesExceeded { attempts: 2, .. }))
        ));
        assert_eq!(http.calls_for("/AAPL/"), 2);
    }

    #[tokio::test]
    async fn empty_ticker_list_yields_empty_report() {
        let report = orchestrator(Arc::new(ScriptedHttpClient::new()))
            .run(&[], &query())
            .await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.succeeded(), 0);
    }
}
