use serde::Deserialize;
use serde_json::Value;

use crate::chart::classify::LegacyPoint;
use crate::chart::{Diagnostic, RecordKind};
use crate::error::{ChartError, RecordError};
use crate::model::marker::OrderMarker;
use crate::model::order::OrderSide;
use crate::model::point::MarkerDetail;
use crate::model::tick::MinuteTick;
use crate::model::timestamp::RawTimestamp;

/// Accept numbers the backend sends either as JSON numbers or numeric strings.
pub fn opt_string_or_number_to_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Value::Number(n) => Ok(n.as_f64()),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// Order numbers show up as strings or as bare integers.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(serde::de::Error::custom("invalid identifier")),
    }
}

/// One element of the minute series (`GET /stock-minute-data`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTick {
    #[serde(alias = "time", alias = "datetime", alias = "tradeTime")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(
        default,
        alias = "price",
        alias = "current_price",
        deserialize_with = "opt_string_or_number_to_f64"
    )]
    pub current_price: Option<f64>,
    #[serde(
        default,
        alias = "avgPrice",
        alias = "average_price",
        deserialize_with = "opt_string_or_number_to_f64"
    )]
    pub average_price: Option<f64>,
}

impl TryFrom<WireTick> for MinuteTick {
    type Error = RecordError;

    fn try_from(w: WireTick) -> Result<Self, Self::Error> {
        Ok(MinuteTick {
            timestamp: w.timestamp.ok_or(RecordError::MissingField("timestamp"))?,
            current_price: w.current_price.ok_or(RecordError::MissingField("currentPrice"))?,
            average_price: w.average_price,
        })
    }
}

/// One buy/sell execution from the trade-point list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMarker {
    #[serde(alias = "time", alias = "datetime", alias = "tradeTime")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default, alias = "tradePrice", deserialize_with = "opt_string_or_number_to_f64")]
    pub price: Option<f64>,
    #[serde(alias = "pointType", alias = "direction")]
    pub side: Option<String>,
    #[serde(
        default,
        alias = "orderNo",
        alias = "order_no",
        deserialize_with = "opt_string_or_number"
    )]
    pub order_number: Option<String>,
    #[serde(default, alias = "qty", deserialize_with = "opt_string_or_number_to_f64")]
    pub quantity: Option<f64>,
    #[serde(default, alias = "filledQty", deserialize_with = "opt_string_or_number_to_f64")]
    pub filled_quantity: Option<f64>,
    #[serde(default, alias = "accountName")]
    pub account_label: Option<String>,
    #[serde(default, alias = "remark")]
    pub annotation: Option<String>,
}

impl TryFrom<WireMarker> for OrderMarker {
    type Error = RecordError;

    fn try_from(w: WireMarker) -> Result<Self, Self::Error> {
        let raw_side = w.side.ok_or(RecordError::MissingField("side"))?;
        let side = OrderSide::parse(&raw_side).ok_or(RecordError::UnknownSide(raw_side))?;
        Ok(OrderMarker {
            timestamp: w.timestamp.ok_or(RecordError::MissingField("timestamp"))?,
            price: w.price.ok_or(RecordError::MissingField("price"))?,
            side,
            order_number: w.order_number,
            quantity: w.quantity,
            filled_quantity: w.filled_quantity,
            account_label: w.account_label,
            annotation: w.annotation,
        })
    }
}

/// One element of the older flat payload, tagged by free text in `type`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLegacyPoint {
    #[serde(alias = "time", alias = "datetime")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default, alias = "price", deserialize_with = "opt_string_or_number_to_f64")]
    pub value: Option<f64>,
    #[serde(rename = "type", default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub point_type: Option<String>,
    #[serde(
        default,
        alias = "orderNo",
        alias = "order_no",
        deserialize_with = "opt_string_or_number"
    )]
    pub order_number: Option<String>,
    #[serde(default, alias = "qty", deserialize_with = "opt_string_or_number_to_f64")]
    pub quantity: Option<f64>,
    #[serde(default, alias = "filledQty", deserialize_with = "opt_string_or_number_to_f64")]
    pub filled_quantity: Option<f64>,
    #[serde(default, alias = "accountName")]
    pub account_label: Option<String>,
    #[serde(default, alias = "remark")]
    pub annotation: Option<String>,
}

impl TryFrom<WireLegacyPoint> for LegacyPoint {
    type Error = RecordError;

    fn try_from(w: WireLegacyPoint) -> Result<Self, Self::Error> {
        Ok(LegacyPoint {
            timestamp: w.timestamp.ok_or(RecordError::MissingField("timestamp"))?,
            value: w.value.ok_or(RecordError::MissingField("value"))?,
            tag: w.tag.unwrap_or_default(),
            point_type: w.point_type,
            order_number: w.order_number,
            detail: MarkerDetail {
                quantity: w.quantity,
                filled_quantity: w.filled_quantity,
                account_label: w.account_label,
                annotation: w.annotation,
            },
        })
    }
}

const TICK_KEYS: &[&str] = &["ticks", "minuteData", "minute_data"];
const MARKER_KEYS: &[&str] = &["markers", "tradePoints", "trade_points", "orders"];
const LEGACY_KEYS: &[&str] = &["points", "chartData", "list"];

/// Records that survived decoding, each with its position in the wire array.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub positions: Vec<usize>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            positions: Vec::new(),
        }
    }
}

impl<T> Decoded<T> {
    /// Wire position of the record at `index` in `records`.
    pub fn source_index(&self, index: usize) -> usize {
        self.positions.get(index).copied().unwrap_or(index)
    }
}

/// A decoded minute-data response. Per-element failures are kept as
/// diagnostics; only the shape of the payload itself can fail.
#[derive(Debug, Clone)]
pub enum MinuteDataPayload {
    Structured {
        ticks: Decoded<MinuteTick>,
        markers: Decoded<OrderMarker>,
        diagnostics: Vec<Diagnostic>,
    },
    Legacy {
        points: Decoded<LegacyPoint>,
        diagnostics: Vec<Diagnostic>,
    },
}

impl MinuteDataPayload {
    pub fn from_value(value: &Value) -> Result<Self, ChartError> {
        let body = unwrap_envelope(value)?;
        match body {
            Value::Array(items) => Ok(Self::legacy(items)),
            Value::Object(map) => {
                let ticks = collection(map, TICK_KEYS)?;
                let markers = collection(map, MARKER_KEYS)?;
                if ticks.is_some() || markers.is_some() {
                    let (ticks, mut diagnostics) =
                        decode_each::<WireTick, MinuteTick>(ticks.unwrap_or(&[]), RecordKind::Tick);
                    let (markers, marker_diags) = decode_each::<WireMarker, OrderMarker>(
                        markers.unwrap_or(&[]),
                        RecordKind::Marker,
                    );
                    diagnostics.extend(marker_diags);
                    return Ok(Self::Structured {
                        ticks,
                        markers,
                        diagnostics,
                    });
                }
                match collection(map, LEGACY_KEYS)? {
                    Some(items) => Ok(Self::legacy(items)),
                    None => Err(ChartError::Structural(format!(
                        "no minute-data collection found (expected one of {:?})",
                        TICK_KEYS
                            .iter()
                            .chain(MARKER_KEYS)
                            .chain(LEGACY_KEYS)
                            .collect::<Vec<_>>()
                    ))),
                }
            }
            other => Err(ChartError::Structural(format!(
                "expected an object or array, got {}",
                json_type_name(other)
            ))),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Structured { diagnostics, .. } | Self::Legacy { diagnostics, .. } => diagnostics,
        }
    }

    fn legacy(items: &[Value]) -> Self {
        let (points, diagnostics) =
            decode_each::<WireLegacyPoint, LegacyPoint>(items, RecordKind::LegacyPoint);
        Self::Legacy { points, diagnostics }
    }
}

/// Strip the admin API's `{ code, msg, data }` wrapper when present.
fn unwrap_envelope(value: &Value) -> Result<&Value, ChartError> {
    let Value::Object(map) = value else {
        return Ok(value);
    };
    let Some(data) = map.get("data") else {
        return Ok(value);
    };
    if let Some(code) = map.get("code").and_then(Value::as_i64) {
        if code != 0 && code != 200 {
            let msg = map
                .get("msg")
                .or_else(|| map.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ChartError::Backend { code, msg });
        }
    }
    if data.is_null() {
        return Err(ChartError::Structural("response data is null".to_string()));
    }
    Ok(data)
}

fn collection<'a>(
    map: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Result<Option<&'a [Value]>, ChartError> {
    for key in keys {
        match map.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => return Ok(Some(items.as_slice())),
            Some(other) => {
                return Err(ChartError::Structural(format!(
                    "'{}' must be an array, got {}",
                    key,
                    json_type_name(other)
                )))
            }
        }
    }
    Ok(None)
}

fn decode_each<W, T>(items: &[Value], kind: RecordKind) -> (Decoded<T>, Vec<Diagnostic>)
where
    W: serde::de::DeserializeOwned,
    T: TryFrom<W, Error = RecordError>,
{
    let mut out = Decoded {
        records: Vec::with_capacity(items.len()),
        positions: Vec::with_capacity(items.len()),
    };
    let mut diagnostics = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let decoded = W::deserialize(item)
            .map_err(|e| RecordError::Decode(e.to_string()))
            .and_then(T::try_from);
        match decoded {
            Ok(record) => {
                out.records.push(record);
                out.positions.push(index);
            }
            Err(error) => {
                tracing::warn!(kind = %kind, index, error = %error, "Dropping undecodable record");
                diagnostics.push(Diagnostic { kind, index, error });
            }
        }
    }
    (out, diagnostics)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
