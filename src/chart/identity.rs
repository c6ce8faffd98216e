use crate::model::order::OrderSide;
use crate::model::point::MarkerIdentity;

/// Identity of a buy/sell marker: the order number when the backend sent
/// one, else `side:instant_ms`. Pure, so a re-fetched marker always maps to
/// the overlay it replaces.
pub fn marker_identity(order_number: Option<&str>, side: OrderSide, instant_ms: i64) -> MarkerIdentity {
    match order_number.map(str::trim).filter(|s| !s.is_empty()) {
        Some(order_no) => MarkerIdentity::new(order_no),
        None => MarkerIdentity::new(format!("{}:{}", side.as_key(), instant_ms)),
    }
}
