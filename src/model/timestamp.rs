use std::fmt;

use serde::{Deserialize, Serialize};

/// A timestamp exactly as the backend sent it: either an ISO-8601 style
/// date-time string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(i64),
    Text(String),
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(s: String) -> Self {
        RawTimestamp::Text(s)
    }
}

impl From<i64> for RawTimestamp {
    fn from(ms: i64) -> Self {
        RawTimestamp::EpochMillis(ms)
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::EpochMillis(ms) => write!(f, "{}", ms),
            RawTimestamp::Text(s) => write!(f, "{}", s),
        }
    }
}
