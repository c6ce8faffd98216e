use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesRole {
    CurrentPrice,
    AveragePrice,
    BuyMarker,
    SellMarker,
}

impl SeriesRole {
    pub fn for_side(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => SeriesRole::BuyMarker,
            OrderSide::Sell => SeriesRole::SellMarker,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, SeriesRole::BuyMarker | SeriesRole::SellMarker)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesRole::CurrentPrice => "current-price",
            SeriesRole::AveragePrice => "average-price",
            SeriesRole::BuyMarker => "buy-marker",
            SeriesRole::SellMarker => "sell-marker",
        }
    }
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two line series. Marker points are built from an [`OrderSide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSeries {
    Current,
    Average,
}

impl PriceSeries {
    pub fn role(self) -> SeriesRole {
        match self {
            PriceSeries::Current => SeriesRole::CurrentPrice,
            PriceSeries::Average => SeriesRole::AveragePrice,
        }
    }
}

/// Stable key for a buy/sell overlay across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerIdentity(String);

impl MarkerIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display-only details carried by marker points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// The unit handed to the chart surface.
///
/// Price and average points are built with [`ChartPoint::series`]; marker
/// points only through [`ChartPoint::marker`], which requires an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub time_label: String,
    pub instant_ms: i64,
    pub value: f64,
    #[serde(rename = "role")]
    pub series_role: SeriesRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<MarkerIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<MarkerDetail>,
}

impl ChartPoint {
    pub fn series(series: PriceSeries, time_label: &str, instant_ms: i64, value: f64) -> Self {
        Self {
            time_label: time_label.to_string(),
            instant_ms,
            value,
            series_role: series.role(),
            identity: None,
            detail: None,
        }
    }

    pub fn marker(
        side: OrderSide,
        identity: MarkerIdentity,
        time_label: &str,
        instant_ms: i64,
        value: f64,
    ) -> Self {
        Self {
            time_label: time_label.to_string(),
            instant_ms,
            value,
            series_role: SeriesRole::for_side(side),
            identity: Some(identity),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: MarkerDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn side(&self) -> Option<OrderSide> {
        match self.series_role {
            SeriesRole::BuyMarker => Some(OrderSide::Buy),
            SeriesRole::SellMarker => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_kebab_case() {
        let p = ChartPoint::series(PriceSeries::Average, "01-02 09:30", 0, 95.0);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["role"], "average-price");
        assert_eq!(v["timeLabel"], "01-02 09:30");
        assert!(v.get("identity").is_none());
    }

    #[test]
    fn marker_point_carries_identity() {
        let p = ChartPoint::marker(OrderSide::Sell, MarkerIdentity::new("X9"), "01-02 10:00", 1, 10.0);
        assert_eq!(p.series_role, SeriesRole::SellMarker);
        assert_eq!(p.identity.as_ref().map(|i| i.as_str()), Some("X9"));
        assert_eq!(p.side(), Some(OrderSide::Sell));
    }

    #[test]
    fn line_points_never_carry_marker_roles() {
        for series in [PriceSeries::Current, PriceSeries::Average] {
            let p = ChartPoint::series(series, "x", 0, 1.0);
            assert!(!p.series_role.is_marker());
            assert!(p.identity.is_none());
            assert_eq!(p.side(), None);
        }
    }
}
