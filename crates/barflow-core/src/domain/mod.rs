//! # Domain Models
//!
//! Typed records for the aggregates pipeline.
//!
//! ## Overview
//!
//! Upstream JSON is decoded into these types at the API boundary, so schema
//! problems surface as a [`SchemaError`](crate::SchemaError) instead of a
//! missing key deep in the pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated stock symbol |
//! | [`Timespan`] | Aggregate window unit (minute, day, ...) |
//! | [`AggregatesQuery`] | Date range and granularity shared by a run |
//! | [`TickerRequest`] | One ticker plus its query |
//! | [`RawBar`] | Bar as returned upstream |
//! | [`ResponseMetadata`] | Envelope fields returned alongside bars |
//! | [`EnrichedBar`] | Bar with UTC/exchange timestamps and [`Outcome`] |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`ExchangeDateTime`] | Timestamp in the exchange's local offset |

mod models;
mod request;
mod ticker;
mod timespan;
mod timestamp;

pub use models::{EnrichedBar, Outcome, RawBar, ResponseMetadata};
pub use request::{format_date, parse_date, AggregatesQuery, TickerRequest, MAX_LIMIT};
pub use ticker::Ticker;
pub use timespan::Timespan;
pub use timestamp::{ExchangeDateTime, UtcDateTime};
