//! CLI argument definitions for barflow.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--tickers` | `AAPL,MSFT,GOOGL` | Comma separated tickers, fetched in order |
//! | `--from` | `2025-01-01` | First date of the range (YYYY-MM-DD) |
//! | `--to` | `2025-01-03` | Last date of the range (YYYY-MM-DD) |
//! | `--timespan` | `day` | Aggregate window unit |
//! | `--multiplier` | `1` | Window size in `timespan` units |
//! | `--limit` | `500` | Max base aggregates per request |
//! | `--offset` | `0` | Result offset |
//! | `--adjusted` | `false` | Request split-adjusted bars |
//! | `--output` | `results.json` | Output file, overwritten each run |
//! | `--log-file` | `etl.log` | Log file, appended to |
//!
//! The API key and transport settings come from the environment; see
//! `barflow_core::config`.
//!
//! # Examples
//!
//! ```bash
//! POLYGON_API=... barflow
//! barflow --tickers AAPL,NVDA --from 2024-06-01 --to 2024-06-30 --output june.json
//! barflow --tickers SPY --timespan hour --multiplier 4 --limit 5000
//! ```

use std::path::PathBuf;

use barflow_core::{parse_date, AggregatesQuery, Ticker, Timespan, ValidationError};
use clap::Parser;
use time::Date;

/// Fetch historical aggregate bars, label them, and save a flat table.
#[derive(Debug, Parser)]
#[command(name = "barflow", author, version, about)]
pub struct Cli {
    /// Tickers to fetch, comma separated.
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = Ticker::parse,
        default_value = "AAPL,MSFT,GOOGL"
    )]
    pub tickers: Vec<Ticker>,

    /// First date of the range (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date, default_value = "2025-01-01")]
    pub from: Date,

    /// Last date of the range (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date, default_value = "2025-01-03")]
    pub to: Date,

    /// Aggregate window unit.
    #[arg(long, default_value_t = Timespan::Day)]
    pub timespan: Timespan,

    /// Window size in timespan units.
    #[arg(long, default_value_t = 1)]
    pub multiplier: u32,

    /// Maximum number of base aggregates per request.
    #[arg(long, default_value_t = 500)]
    pub limit: u32,

    /// Offset into the result set.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Request split-adjusted bars.
    #[arg(long, default_value_t = false)]
    pub adjusted: bool,

    /// Output JSON file. Replaced on every run.
    #[arg(long, default_value = "results.json")]
    pub output: PathBuf,

    /// Log file. Appended to on every run.
    #[arg(long, default_value = "etl.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn query(&self) -> Result<AggregatesQuery, ValidationError> {
        Ok(AggregatesQuery::new(self.from, self.to)
            .with_timespan(self.timespan)
            .with_multiplier(self.multiplier)?
            .with_limit(self.limit)?
            .with_offset(self.offset)
            .with_adjusted(self.adjusted))
    }
}
