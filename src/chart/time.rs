use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::RecordError;
use crate::model::timestamp::RawTimestamp;

pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;
pub const DEFAULT_LABEL_FORMAT: &str = "%m-%d %H:%M";

const MIN_MILLIS_DIGITS: usize = 12;

// Offset-less layouts, interpreted in the display timezone.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Canonical form of a timestamp: a sortable instant plus its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTime {
    pub instant_ms: i64,
    pub label: String,
}

/// Turns backend timestamps into instants and fixed-timezone labels.
#[derive(Debug, Clone)]
pub struct TimeNormalizer {
    offset: FixedOffset,
    label_format: String,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
        }
    }
}

impl TimeNormalizer {
    /// Returns `None` when the offset is outside +/- 24h or the label
    /// format is not a valid strftime pattern.
    pub fn new(utc_offset_minutes: i32, label_format: &str) -> Option<Self> {
        if label_format.is_empty()
            || StrftimeItems::new(label_format).any(|item| matches!(item, Item::Error))
        {
            return None;
        }
        let offset = FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)?;
        Some(Self {
            offset,
            label_format: label_format.to_string(),
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn normalize(&self, raw: &RawTimestamp) -> Result<NormalizedTime, RecordError> {
        let instant = self.parse_instant(raw)?;
        let instant_ms = instant.timestamp_millis();
        Ok(NormalizedTime {
            label: self.label_for_millis(instant_ms)?,
            instant_ms,
        })
    }

    /// Label derivation depends only on the instant, so equal instants
    /// always share a label regardless of how they were written.
    pub fn label_for_millis(&self, instant_ms: i64) -> Result<String, RecordError> {
        let dt = self.at_millis(instant_ms)?;
        Ok(dt.format(&self.label_format).to_string())
    }

    pub fn parse_instant(&self, raw: &RawTimestamp) -> Result<DateTime<FixedOffset>, RecordError> {
        match raw {
            RawTimestamp::EpochMillis(ms) => self.at_millis(*ms),
            RawTimestamp::Text(text) => self.parse_text(text),
        }
    }

    fn parse_text(&self, text: &str) -> Result<DateTime<FixedOffset>, RecordError> {
        let s = text.trim();
        if s.is_empty() {
            return Err(RecordError::InvalidTimestamp(text.to_string()));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            // Shorter digit runs are compact dates or epoch seconds, not millis.
            if s.len() < MIN_MILLIS_DIGITS {
                return Err(RecordError::InvalidTimestamp(text.to_string()));
            }
            let ms: i64 = s
                .parse()
                .map_err(|_| RecordError::InvalidTimestamp(text.to_string()))?;
            return self.at_millis(ms);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&self.offset));
        }
        for layout in NAIVE_LAYOUTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
                return self
                    .offset
                    .from_local_datetime(&naive)
                    .single()
                    .ok_or_else(|| RecordError::InvalidTimestamp(text.to_string()));
            }
        }
        Err(RecordError::InvalidTimestamp(text.to_string()))
    }

    fn at_millis(&self, ms: i64) -> Result<DateTime<FixedOffset>, RecordError> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map(|dt| dt.with_timezone(&self.offset))
            .ok_or_else(|| RecordError::InvalidTimestamp(ms.to_string()))
    }
}
