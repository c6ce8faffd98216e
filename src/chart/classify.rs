use crate::model::order::OrderSide;
use crate::model::point::{MarkerDetail, SeriesRole};
use crate::model::timestamp::RawTimestamp;

/// A point from the older minute-data payloads, where the series is named by
/// a free-text `type` label instead of a structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPoint {
    pub timestamp: RawTimestamp,
    pub value: f64,
    pub tag: String,
    pub point_type: Option<String>,
    pub order_number: Option<String>,
    pub detail: MarkerDetail,
}

impl LegacyPoint {
    pub fn new(timestamp: impl Into<RawTimestamp>, value: f64, tag: &str) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            tag: tag.to_string(),
            point_type: None,
            order_number: None,
            detail: MarkerDetail::default(),
        }
    }

    pub fn point_type(mut self, point_type: &str) -> Self {
        self.point_type = Some(point_type.to_string());
        self
    }

    pub fn order_number(mut self, order_number: &str) -> Self {
        self.order_number = Some(order_number.to_string());
        self
    }
}

// Checked in order; markers and average come before current price because
// their labels often contain the word "price" / "价".
const TAG_VARIANTS: &[(SeriesRole, &[&str])] = &[
    (
        SeriesRole::BuyMarker,
        &["买入点", "买点", "买入", "buy marker", "buy point", "buy"],
    ),
    (
        SeriesRole::SellMarker,
        &["卖出点", "卖点", "卖出", "sell marker", "sell point", "sell"],
    ),
    (
        SeriesRole::AveragePrice,
        &["均价", "平均价", "average price", "average", "avg price", "avg"],
    ),
    (
        SeriesRole::CurrentPrice,
        &["当前价", "现价", "最新价", "current price", "current", "price"],
    ),
];

/// Resolve a free-text series label. Exact matches win over substring
/// matches; unknown labels yield `None`.
pub fn role_from_tag(tag: &str) -> Option<SeriesRole> {
    let t = tag.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }
    for (role, variants) in TAG_VARIANTS {
        if variants.iter().any(|v| *v == t) {
            return Some(*role);
        }
    }
    for (role, variants) in TAG_VARIANTS {
        if variants.iter().any(|v| t.contains(v)) {
            return Some(*role);
        }
    }
    None
}

/// Role of a legacy point. A recognised `pointType` beats the prose tag.
pub fn classify_point(point: &LegacyPoint) -> Option<SeriesRole> {
    if let Some(side) = point.point_type.as_deref().and_then(OrderSide::parse) {
        return Some(SeriesRole::for_side(side));
    }
    role_from_tag(&point.tag)
}

/// Disjoint per-role partitions of a legacy batch, input order preserved.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuckets<T> {
    pub current: Vec<T>,
    pub average: Vec<T>,
    pub buy: Vec<T>,
    pub sell: Vec<T>,
    pub unclassified: usize,
}

impl<T> SeriesBuckets<T> {
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            average: Vec::new(),
            buy: Vec::new(),
            sell: Vec::new(),
            unclassified: 0,
        }
    }

    pub fn push(&mut self, role: SeriesRole, item: T) {
        match role {
            SeriesRole::CurrentPrice => self.current.push(item),
            SeriesRole::AveragePrice => self.average.push(item),
            SeriesRole::BuyMarker => self.buy.push(item),
            SeriesRole::SellMarker => self.sell.push(item),
        }
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.average.len() + self.buy.len() + self.sell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition a legacy batch; each entry keeps its index in `points`.
pub fn classify(points: &[LegacyPoint]) -> SeriesBuckets<(usize, &LegacyPoint)> {
    let mut buckets = SeriesBuckets::new();
    for (index, point) in points.iter().enumerate() {
        match classify_point(point) {
            Some(role) => buckets.push(role, (index, point)),
            None => {
                tracing::debug!(tag = %point.tag, "Dropping point with unrecognized series tag");
                buckets.unclassified += 1;
            }
        }
    }
    buckets
}
