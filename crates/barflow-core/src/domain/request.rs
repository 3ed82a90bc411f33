use time::macros::format_description;
use time::Date;

use crate::{Ticker, Timespan, ValidationError};

/// Upper bound the aggregates endpoint accepts for `limit`.
pub const MAX_LIMIT: u32 = 50_000;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Format a date the way the aggregates URL path expects it.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Range and granularity parameters shared by every ticker in a run.
///
/// Date ordering is not checked; an inverted range is passed through and the
/// upstream answers with an empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatesQuery {
    pub from_date: Date,
    pub to_date: Date,
    pub timespan: Timespan,
    pub multiplier: u32,
    pub limit: u32,
    pub offset: u32,
    pub adjusted: bool,
}

impl AggregatesQuery {
    pub fn new(from_date: Date, to_date: Date) -> Self {
        Self {
            from_date,
            to_date,
            timespan: Timespan::Day,
            multiplier: 1,
            limit: 500,
            offset: 0,
            adjusted: false,
        }
    }

    pub fn with_timespan(mut self, timespan: Timespan) -> Self {
        self.timespan = timespan;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Result<Self, ValidationError> {
        if multiplier == 0 {
            return Err(ValidationError::ZeroMultiplier);
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    pub fn with_limit(mut self, limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ValidationError::InvalidLimit {
                value: limit,
                max: MAX_LIMIT,
            });
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }
}

/// Everything needed to build the request URL for one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    pub ticker: Ticker,
    pub query: AggregatesQuery,
}

impl TickerRequest {
    pub fn new(ticker: Ticker, query: AggregatesQuery) -> Self {
        Self { ticker, query }
    }
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::*;

    #[test]
    fn parses_and_formats_dates() {
        let date = parse_date("2025-01-03").expect("date should parse");
        assert_eq!(date, Date::from_calendar_date(2025, Month::January, 3).expect("valid"));
        assert_eq!(format_date(date), "2025-01-03");
    }

    #[test]
    fn rejects_malformed_date() {
        let err = parse_date("01/03/2025").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn query_defaults_match_daily_job() {
        let from = parse_date("2025-01-01").expect("valid");
        let to = parse_date("2025-01-03").expect("valid");
        let query = AggregatesQuery::new(from, to);

        assert_eq!(query.timespan, Timespan::Day);
        assert_eq!(query.multiplier, 1);
        assert_eq!(query.limit, 500);
        assert_eq!(query.offset, 0);
        assert!(!query.adjusted);
    }

    #[test]
    fn rejects_zero_multiplier_and_out_of_range_limit() {
        let date = parse_date("2025-01-01").expect("valid");
        let query = AggregatesQuery::new(date, date);

        assert_eq!(
            query.with_multiplier(0).expect_err("must fail"),
            ValidationError::ZeroMultiplier
        );
        assert!(matches!(
            query.with_limit(MAX_LIMIT + 1),
            Err(ValidationError::InvalidLimit { .. })
        ));
        assert!(query.with_limit(0).is_err());
    }
}
