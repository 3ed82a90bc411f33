use thiserror::Error;

/// Validation errors raised while building typed requests and domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error(
        "invalid timespan '{value}', expected one of second, minute, hour, day, week, month, quarter, year"
    )]
    InvalidTimespan { value: String },
    #[error("multiplier must be at least 1")]
    ZeroMultiplier,
    #[error("limit {value} must be between 1 and {max}")]
    InvalidLimit { value: u32, max: u32 },
    #[error("date '{value}' must be formatted as YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
}

/// Failure of a single HTTP fetch, before or after retries are exhausted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("maximum retry attempts reached ({attempts}); last error: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
    #[error("per-ticker deadline of {deadline_ms}ms exceeded after {attempts} attempt(s)")]
    DeadlineExceeded { deadline_ms: u64, attempts: u32 },
}

impl FetchError {
    /// Transient errors are retried by the fetch loop; terminal ones end it.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// Response payload did not match the aggregates schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("response body is not valid JSON: {reason}")]
    InvalidJson { reason: String },
    #[error("response has no 'results' field")]
    MissingResults,
    #[error("response envelope is malformed: {reason}")]
    MalformedEnvelope { reason: String },
    #[error("bar at index {index} is malformed: {reason}")]
    MalformedBar { index: usize, reason: String },
    #[error("bar timestamp {t} is out of range")]
    TimestampOutOfRange { t: i64 },
    #[error("bar timestamp {t} cannot be written as RFC3339: {reason}")]
    UnformattableTimestamp { t: i64, reason: String },
}

/// Everything that can fail for one ticker. Never escapes the ticker boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Startup configuration errors. Fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {var} is not set")]
    MissingApiKey { var: &'static str },
    #[error("environment variable {var} is invalid: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Failure while writing the final table.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to serialize rows: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
