//! # Barflow Core
//!
//! Batch extraction of historical aggregate bars from the Polygon API,
//! enrichment with a derived trading signal, and flattening into a
//! deduplicated table.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Environment configuration |
//! | [`domain`] | Typed requests and records |
//! | [`enrich`] | Sorting, timestamp conversion, outcome labels |
//! | [`error`] | Error taxonomy |
//! | [`flatten`] | One row per bar, exact-duplicate removal |
//! | [`http_client`] | HTTP transport seam |
//! | [`orchestrator`] | Sequential per-ticker run |
//! | [`polygon`] | URL construction, fetch with retry, response decoding |
//! | [`retry`] | Backoff with jitter |
//! | [`sink`] | JSON output file |
//!
//! ## Data flow
//!
//! ```text
//! tickers ─▶ URLs ─▶ JSON responses ─▶ enriched bars ─▶ flat rows ─▶ file
//!            (polygon)                 (enrich)         (flatten)    (sink)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use barflow_core::{parse_date, AggregatesQuery, Config, Orchestrator, PolygonClient, Ticker};
//!
//! let config = Config::from_env()?;
//! let client = PolygonClient::new(config.base_url.clone(), config.api_key.clone())
//!     .with_retry(config.retry());
//! let query = AggregatesQuery::new(parse_date("2025-01-01")?, parse_date("2025-01-03")?);
//! let report = Orchestrator::new(client)
//!     .run(&Ticker::parse_list("AAPL,MSFT")?, &query)
//!     .await;
//! let rows = barflow_core::flatten::flatten_dedup(&report.outcomes)?;
//! barflow_core::sink::write_json("results.json".as_ref(), &rows)?;
//! ```
//!
//! ## Error Handling
//!
//! Per-ticker failures ([`FetchError`], [`SchemaError`]) are returned inside
//! each [`FetchOutcome`] and never abort a run. Only [`ConfigError`] and
//! [`PersistenceError`] end it.

pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod flatten;
pub mod http_client;
pub mod orchestrator;
pub mod polygon;
pub mod retry;
pub mod sink;

pub use config::Config;

pub use domain::{
    format_date, parse_date, AggregatesQuery, EnrichedBar, ExchangeDateTime, Outcome, RawBar,
    ResponseMetadata, Ticker, TickerRequest, Timespan, UtcDateTime, MAX_LIMIT,
};

pub use enrich::{classify, enrich, EXCHANGE_TZ};

pub use error::{
    ConfigError, CoreError, FetchError, PersistenceError, SchemaError, TickerError,
    ValidationError,
};

pub use flatten::{dedup, flatten, flatten_dedup, FlatRow};

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
};

pub use orchestrator::{FetchOutcome, FetchStatus, Orchestrator, RunReport, TickerPayload};

pub use polygon::{build_url, parse_aggregates, redact_api_key, PolygonClient, DEFAULT_BASE_URL};

pub use retry::{Backoff, RetryConfig};

pub use sink::{read_json, write_json};
