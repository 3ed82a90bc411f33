//! Bar enrichment: chronological ordering, timestamp conversion, and the
//! bull/bear/neutral outcome label.
//!
//! Pure transforms only; nothing here performs I/O.

use chrono::{DateTime, Offset};
use chrono_tz::Tz;
use time::UtcOffset;

use crate::error::SchemaError;
use crate::{EnrichedBar, ExchangeDateTime, Outcome, RawBar, UtcDateTime};

/// Time zone the bar timestamps are anchored to.
pub const EXCHANGE_TZ: Tz = chrono_tz::America::New_York;

/// Stable ascending sort by bar timestamp; ties keep their input order.
pub fn sort_bars(mut bars: Vec<RawBar>) -> Vec<RawBar> {
    bars.sort_by_key(|bar| bar.timestamp_ms);
    bars
}

/// Label `current` relative to the bar immediately before it.
pub fn classify(previous: &RawBar, current: &RawBar) -> Outcome {
    let heavier = current.volume > previous.volume;
    if heavier && current.close > current.open {
        Outcome::Bull
    } else if heavier && current.close < current.open {
        Outcome::Bear
    } else {
        Outcome::Neutral
    }
}

/// Express the instant at `timestamp_ms` in `tz`, using the offset in force on
/// that date (daylight saving included).
pub fn exchange_time(timestamp_ms: i64, tz: Tz) -> Result<ExchangeDateTime, SchemaError> {
    let out_of_range = || SchemaError::TimestampOutOfRange { t: timestamp_ms };

    let utc = UtcDateTime::from_unix_millis(timestamp_ms).ok_or_else(out_of_range)?;
    let local = DateTime::from_timestamp_millis(timestamp_ms)
        .ok_or_else(out_of_range)?
        .with_timezone(&tz);
    let offset = UtcOffset::from_whole_seconds(local.offset().fix().local_minus_utc())
        .map_err(|_| out_of_range())?;
    let local = ExchangeDateTime::new(utc, offset);

    // RFC3339 has no seconds in offsets (pre-1883 LMT) and no years outside
    // 0..=9999; such bars must fail here rather than when the table is saved.
    for formatted in [utc.format_rfc3339(), local.format_rfc3339()] {
        formatted.map_err(|error| SchemaError::UnformattableTimestamp {
            t: timestamp_ms,
            reason: error.to_string(),
        })?;
    }

    Ok(local)
}

/// Sort, convert, and classify one ticker's bars in the exchange time zone.
pub fn enrich(bars: Vec<RawBar>) -> Result<Vec<EnrichedBar>, SchemaError> {
    enrich_in(bars, EXCHANGE_TZ)
}

/// [`enrich`] with an explicit exchange time zone.
pub fn enrich_in(bars: Vec<RawBar>, tz: Tz) -> Result<Vec<EnrichedBar>, SchemaError> {
    let bars = sort_bars(bars);

    let outcomes: Vec<Outcome> = std::iter::once(Outcome::Undefined)
        .chain(bars.windows(2).map(|pair| classify(&pair[0], &pair[1])))
        .collect();

    bars.into_iter()
        .zip(outcomes)
        .map(|(raw, outcome)| {
            let local = exchange_time(raw.timestamp_ms, tz)?;
            Ok(EnrichedBar {
                utc_instant: local.to_utc(),
                exchange_time: local,
                outcome,
                raw,
            })
        })
        .collect()
}
