//! Polygon aggregates fetch client.
//!
//! Builds `/v2/aggs/ticker/...` URLs, issues GETs with bounded retry, and
//! decodes the response envelope into typed records.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FetchError, SchemaError, TickerError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::RetryConfig;
use crate::{format_date, RawBar, ResponseMetadata, TickerRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

const AGGREGATES_PATH: &str = "/v2/aggs/ticker/";
const REDACTED: &str = "REDACTED";

/// Build the aggregates URL for one ticker. Pure; performs no validation of
/// date ordering.
pub fn build_url(base_url: &str, request: &TickerRequest, api_key: &str) -> String {
    let query = &request.query;
    format!(
        "{base}{AGGREGATES_PATH}{ticker}/range/{multiplier}/{timespan}/{from}/{to}\
         ?apiKey={key}&adjusted={adjusted}&sort=desc&limit={limit}&offset={offset}",
        base = base_url.trim_end_matches('/'),
        ticker = urlencoding::encode(request.ticker.as_str()),
        multiplier = query.multiplier,
        timespan = query.timespan,
        from = urlencoding::encode(&format_date(query.from_date)),
        to = urlencoding::encode(&format_date(query.to_date)),
        key = urlencoding::encode(api_key),
        adjusted = query.adjusted,
        limit = query.limit,
        offset = query.offset,
    )
}

/// Replace the `apiKey` query value so the URL can be logged or persisted.
pub fn redact_api_key(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_owned();
    };

    let params: Vec<String> = query
        .split('&')
        .map(|param| match param.split_once('=') {
            Some(("apiKey", _)) => format!("apiKey={REDACTED}"),
            _ => param.to_owned(),
        })
        .collect();

    format!("{path}?{}", params.join("&"))
}

/// Split a decoded aggregates response into its metadata and bars.
pub fn parse_aggregates(body: Value) -> Result<(ResponseMetadata, Vec<RawBar>), SchemaError> {
    let Value::Object(mut envelope) = body else {
        return Err(SchemaError::MalformedEnvelope {
            reason: String::from("expected a JSON object"),
        });
    };

    let results = match envelope.remove("results") {
        None | Some(Value::Null) => return Err(SchemaError::MissingResults),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SchemaError::MalformedEnvelope {
                reason: format!("'results' must be an array, got {}", json_kind(&other)),
            })
        }
    };

    let metadata: ResponseMetadata =
        serde_json::from_value(Value::Object(envelope)).map_err(|error| {
            SchemaError::MalformedEnvelope {
                reason: error.to_string(),
            }
        })?;

    let bars = results
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<RawBar>(item).map_err(|error| SchemaError::MalformedBar {
                index,
                reason: error.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((metadata, bars))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Aggregates client with an injected transport.
#[derive(Clone)]
pub struct PolygonClient {
    base_url: String,
    api_key: String,
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl PolygonClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(base_url, api_key, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http_client,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn build_url(&self, request: &TickerRequest) -> String {
        build_url(&self.base_url, request, &self.api_key)
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// Transport failures and non-2xx statuses are retried with backoff up to
    /// the configured number of attempts. A body that is not JSON is a schema
    /// failure and is not retried.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, TickerError> {
        let body = self.fetch_with_retry(url).await?;
        serde_json::from_str(&body).map_err(|error| {
            TickerError::Schema(SchemaError::InvalidJson {
                reason: error.to_string(),
            })
        })
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let started = Instant::now();
        let attempts = self.retry.attempts();
        let mut delays = self.retry.backoff.schedule();
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(url = %redact_api_key(url), attempt, "requesting aggregates");

            let error = match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };
            warn!(
                url = %redact_api_key(url),
                attempt,
                max_attempts = attempts,
                error = %error,
                "fetch attempt failed"
            );
            last_error = Some(error);

            if attempt == attempts {
                break;
            }

            let delay = delays.next().unwrap_or_default();
            if let Some(deadline) = self.retry.deadline {
                if started.elapsed() + delay > deadline {
                    return Err(FetchError::DeadlineExceeded {
                        deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                        attempts: attempt,
                    });
                }
            }
            tokio::time::sleep(delay).await;
        }

        Err(FetchError::MaxRetriesExceeded {
            attempts,
            last_error: last_error
                .map(|error| error.to_string())
                .unwrap_or_else(|| String::from("no attempt made")),
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| FetchError::Transport {
                message: error.message().to_owned(),
            })?;

        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
            });
        }

        Ok(response.body)
    }
}
