use super::timestamp::RawTimestamp;

/// One per-minute price sample from the minute-data endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteTick {
    pub timestamp: RawTimestamp,
    pub current_price: f64,
    pub average_price: Option<f64>,
}

impl MinuteTick {
    pub fn new(timestamp: impl Into<RawTimestamp>, current_price: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            current_price,
            average_price: None,
        }
    }

    pub fn with_average(mut self, average_price: f64) -> Self {
        self.average_price = Some(average_price);
        self
    }
}
