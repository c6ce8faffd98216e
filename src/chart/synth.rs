use std::collections::{HashMap, HashSet};

use crate::model::point::{ChartPoint, PriceSeries};

/// Placeholder ratio used when the backend omits the running average, so the
/// chart always has two comparable lines. Not a statistical estimate.
pub const AVERAGE_FALLBACK_RATIO: f64 = 0.95;

pub fn synthesized_average(current_price: f64) -> f64 {
    current_price * AVERAGE_FALLBACK_RATIO
}

/// Backend average if it is usable, otherwise the synthesized fallback.
/// Zero and non-finite averages count as missing.
pub fn average_or_fallback(current_price: f64, average_price: Option<f64>) -> f64 {
    match average_price {
        Some(avg) if avg.is_finite() && avg > 0.0 => avg,
        _ => synthesized_average(current_price),
    }
}

/// Rebuild the average series against the current-price series: one point
/// per current label, the real average when there is one (the last real one
/// wins) and a synthesized one otherwise. Real averages whose label has no
/// current point are merged back in by instant. Returns the number
/// synthesized.
pub fn fill_missing_averages(current: &[ChartPoint], average: &mut Vec<ChartPoint>) -> usize {
    let mut real: HashMap<String, (usize, ChartPoint)> = HashMap::with_capacity(average.len());
    for (index, point) in average.drain(..).enumerate() {
        real.insert(point.time_label.clone(), (index, point));
    }

    let mut walked = Vec::with_capacity(current.len());
    let mut synthesized = 0;
    let mut emitted = HashSet::new();
    for point in current {
        if !emitted.insert(point.time_label.as_str()) {
            continue;
        }
        match real.remove(&point.time_label) {
            Some((_, avg)) => walked.push(avg),
            None => {
                walked.push(ChartPoint::series(
                    PriceSeries::Average,
                    &point.time_label,
                    point.instant_ms,
                    synthesized_average(point.value),
                ));
                synthesized += 1;
            }
        }
    }

    let mut orphans: Vec<(usize, ChartPoint)> = real.into_values().collect();
    orphans.sort_by_key(|(index, p)| (p.instant_ms, *index));
    let orphans = orphans.into_iter().map(|(_, p)| p).collect();

    *average = merge_by_instant(walked, orphans);
    synthesized
}

fn merge_by_instant(left: Vec<ChartPoint>, right: Vec<ChartPoint>) -> Vec<ChartPoint> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => r.instant_ms < l.instant_ms,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        out.extend(next);
    }
    out
}
