use thiserror::Error;

/// Hard failures: the payload is not a minute-data response at all, or the
/// backend reported an error instead of data.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("structural input error: {0}")]
    Structural(String),

    #[error("backend error (code {code}): {msg}")]
    Backend { code: i64, msg: String },
}

/// Problems confined to a single tick, marker or legacy point. These are
/// recorded as diagnostics and the record is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("unparseable timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid {field}: {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("unknown order side '{0}'")]
    UnknownSide(String),

    #[error("decode failed: {0}")]
    Decode(String),
}
