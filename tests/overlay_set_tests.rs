use autotrade_chart::chart::overlay::OverlaySet;
use autotrade_chart::model::order::OrderSide;
use autotrade_chart::model::point::{ChartPoint, MarkerIdentity, PriceSeries};

fn marker(id: &str, price: f64) -> ChartPoint {
    ChartPoint::marker(OrderSide::Buy, MarkerIdentity::new(id), "01-02 09:31", 0, price)
}

#[test]
/// Verifies a re-fetch correcting X1's price replaces the overlay instead of
/// adding a second one.
fn refetch_replaces_same_identity() {
    let mut set = OverlaySet::new();
    let first = set.replace_batch(vec![marker("X1", 101.0)]);
    assert_eq!(first.added, vec![MarkerIdentity::new("X1")]);

    let second = set.replace_batch(vec![marker("X1", 101.5)]);
    assert_eq!(second.replaced, vec![MarkerIdentity::new("X1")]);
    assert!(second.added.is_empty());
    assert!(second.stale.is_empty());

    assert_eq!(set.len(), 1);
    assert_eq!(set.get(&MarkerIdentity::new("X1")).unwrap().value, 101.5);
}

#[test]
/// Verifies duplicates inside one batch collapse to the last occurrence.
fn last_in_batch_wins() {
    let mut set = OverlaySet::new();
    let diff = set.replace_batch(vec![marker("X1", 1.0), marker("X2", 2.0), marker("X1", 3.0)]);
    assert_eq!(diff.added.len(), 2);
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(&MarkerIdentity::new("X1")).unwrap().value, 3.0);
}

#[test]
/// Verifies markers missing from the new batch are reported stale and removed.
fn missing_markers_become_stale() {
    let mut set = OverlaySet::new();
    set.replace_batch(vec![marker("A", 1.0), marker("B", 2.0)]);
    let diff = set.replace_batch(vec![marker("B", 2.0), marker("C", 3.0)]);

    assert_eq!(diff.stale, vec![MarkerIdentity::new("A")]);
    assert_eq!(diff.replaced, vec![MarkerIdentity::new("B")]);
    assert_eq!(diff.added, vec![MarkerIdentity::new("C")]);
    let ids: Vec<&str> = set
        .iter()
        .map(|p| p.identity.as_ref().unwrap().as_str())
        .collect();
    assert_eq!(ids, vec!["B", "C"]);
}

#[test]
/// Verifies series points without identity are never added as overlays.
fn non_markers_are_ignored() {
    let mut set = OverlaySet::new();
    let price = ChartPoint::series(PriceSeries::Current, "01-02 09:30", 0, 10.0);
    assert!(!set.upsert(price.clone()));
    let diff = set.replace_batch(vec![price]);
    assert!(diff.is_empty());
    assert!(set.is_empty());
}
