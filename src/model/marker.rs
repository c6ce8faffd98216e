use super::order::OrderSide;
use super::timestamp::RawTimestamp;

/// A single buy or sell execution to overlay on the minute chart.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderMarker {
    pub timestamp: RawTimestamp,
    pub price: f64,
    pub side: OrderSide,
    pub order_number: Option<String>,
    pub quantity: Option<f64>,
    pub filled_quantity: Option<f64>,
    pub account_label: Option<String>,
    pub annotation: Option<String>,
}

impl OrderMarker {
    pub fn new(timestamp: impl Into<RawTimestamp>, price: f64, side: OrderSide) -> Self {
        Self {
            timestamp: timestamp.into(),
            price,
            side,
            order_number: None,
            quantity: None,
            filled_quantity: None,
            account_label: None,
            annotation: None,
        }
    }

    pub fn order_number(mut self, order_number: &str) -> Self {
        self.order_number = Some(order_number.to_string());
        self
    }

    /// Order number with surrounding whitespace removed; blank counts as absent.
    pub fn order_number_trimmed(&self) -> Option<&str> {
        self.order_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
