pub mod classify;
pub mod identity;
pub mod overlay;
pub mod synth;
pub mod time;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::backend::types::MinuteDataPayload;
use crate::error::{ChartError, RecordError};
use crate::model::marker::OrderMarker;
use crate::model::order::OrderSide;
use crate::model::point::{ChartPoint, MarkerDetail, PriceSeries, SeriesRole};
use crate::model::tick::MinuteTick;
use crate::model::timestamp::RawTimestamp;

use classify::{classify, LegacyPoint};
use identity::marker_identity;
use synth::{average_or_fallback, fill_missing_averages};
use time::{NormalizedTime, TimeNormalizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Tick,
    Marker,
    LegacyPoint,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Tick => write!(f, "tick"),
            RecordKind::Marker => write!(f, "marker"),
            RecordKind::LegacyPoint => write!(f, "legacy-point"),
        }
    }
}

/// A record that was left out of the chart, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: RecordKind,
    pub index: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: RecordError,
}

fn serialize_display<S: serde::Serializer>(e: &RecordError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub points: Vec<ChartPoint>,
    pub diagnostics: Vec<Diagnostic>,
    /// Legacy points whose series tag matched nothing.
    pub unclassified: usize,
    pub synthesized_averages: usize,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn series(&self, role: SeriesRole) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(move |p| p.series_role == role)
    }

    pub fn markers(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(|p| p.series_role.is_marker())
    }

    fn skip(&mut self, kind: RecordKind, index: usize, error: RecordError) {
        tracing::warn!(kind = %kind, index, error = %error, "Skipping malformed record");
        self.diagnostics.push(Diagnostic { kind, index, error });
    }

    /// Merge in records dropped while decoding the wire payload.
    pub fn with_diagnostics(mut self, mut extra: Vec<Diagnostic>) -> Self {
        extra.append(&mut self.diagnostics);
        extra.sort_by_key(|d| (d.kind as u8, d.index));
        self.diagnostics = extra;
        self
    }
}

/// Turns minute ticks and order markers into chart-ready points.
///
/// Output is the current-price series, then the average-price series, then
/// markers, each in input order. Input is assumed to arrive sorted by time;
/// nothing is re-sorted here.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    normalizer: TimeNormalizer,
}

impl Reconciler {
    pub fn new(normalizer: TimeNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &TimeNormalizer {
        &self.normalizer
    }

    /// Decode a raw backend response and reconcile it. Only a payload that
    /// is not a minute-data response at all is an error.
    pub fn reconcile_json(&self, value: &Value) -> Result<Reconciliation, ChartError> {
        let payload = MinuteDataPayload::from_value(value)?;
        Ok(self.reconcile_payload(&payload))
    }

    /// Diagnostics in the result index into the original wire arrays.
    pub fn reconcile_payload(&self, payload: &MinuteDataPayload) -> Reconciliation {
        match payload {
            MinuteDataPayload::Structured {
                ticks,
                markers,
                diagnostics,
            } => {
                let mut out = self.reconcile(&ticks.records, &markers.records);
                for d in out.diagnostics.iter_mut() {
                    d.index = match d.kind {
                        RecordKind::Tick => ticks.source_index(d.index),
                        _ => markers.source_index(d.index),
                    };
                }
                out.with_diagnostics(diagnostics.clone())
            }
            MinuteDataPayload::Legacy {
                points,
                diagnostics,
            } => {
                let mut out = self.reconcile_legacy(&points.records);
                for d in out.diagnostics.iter_mut() {
                    d.index = points.source_index(d.index);
                }
                out.with_diagnostics(diagnostics.clone())
            }
        }
    }

    pub fn reconcile(&self, ticks: &[MinuteTick], markers: &[OrderMarker]) -> Reconciliation {
        let mut out = Reconciliation::default();
        let mut current = Vec::with_capacity(ticks.len());
        let mut average = Vec::with_capacity(ticks.len());

        for (index, tick) in ticks.iter().enumerate() {
            match self.normalize_tick(tick) {
                Ok(time) => {
                    let avg = average_or_fallback(tick.current_price, tick.average_price);
                    if tick.average_price != Some(avg) {
                        out.synthesized_averages += 1;
                    }
                    current.push(ChartPoint::series(
                        PriceSeries::Current,
                        &time.label,
                        time.instant_ms,
                        tick.current_price,
                    ));
                    average.push(ChartPoint::series(
                        PriceSeries::Average,
                        &time.label,
                        time.instant_ms,
                        avg,
                    ));
                }
                Err(error) => out.skip(RecordKind::Tick, index, error),
            }
        }

        let mut marker_points = Vec::with_capacity(markers.len());
        for (index, marker) in markers.iter().enumerate() {
            match self.marker_point(marker) {
                Ok(point) => marker_points.push(point),
                Err(error) => out.skip(RecordKind::Marker, index, error),
            }
        }

        out.points = current;
        out.points.append(&mut average);
        out.points.append(&mut marker_points);
        out
    }

    /// Same contract for payloads that label series with free text.
    pub fn reconcile_legacy(&self, points: &[LegacyPoint]) -> Reconciliation {
        let mut out = Reconciliation::default();
        let buckets = classify(points);
        out.unclassified = buckets.unclassified;

        let mut current = Vec::with_capacity(buckets.current.len());
        let mut average = Vec::with_capacity(buckets.current.len());
        let mut marker_points = Vec::with_capacity(buckets.buy.len() + buckets.sell.len());

        for (series, bucket) in [
            (PriceSeries::Current, &buckets.current),
            (PriceSeries::Average, &buckets.average),
        ] {
            for &(index, point) in bucket {
                match self.normalize_series_value(&point.timestamp, point.value) {
                    Ok(time) => {
                        let chart_point =
                            ChartPoint::series(series, &time.label, time.instant_ms, point.value);
                        match series {
                            PriceSeries::Current => current.push(chart_point),
                            PriceSeries::Average => average.push(chart_point),
                        }
                    }
                    Err(error) => out.skip(RecordKind::LegacyPoint, index, error),
                }
            }
        }

        let mut legacy_markers: Vec<(OrderSide, usize, &LegacyPoint)> = buckets
            .buy
            .iter()
            .map(|&(i, p)| (OrderSide::Buy, i, p))
            .chain(buckets.sell.iter().map(|&(i, p)| (OrderSide::Sell, i, p)))
            .collect();
        legacy_markers.sort_by_key(|(_, i, _)| *i);
        for (side, index, point) in legacy_markers {
            let marker = OrderMarker {
                timestamp: point.timestamp.clone(),
                price: point.value,
                side,
                order_number: point.order_number.clone(),
                quantity: point.detail.quantity,
                filled_quantity: point.detail.filled_quantity,
                account_label: point.detail.account_label.clone(),
                annotation: point.detail.annotation.clone(),
            };
            match self.marker_point(&marker) {
                Ok(chart_point) => marker_points.push(chart_point),
                Err(error) => out.skip(RecordKind::LegacyPoint, index, error),
            }
        }

        out.synthesized_averages = fill_missing_averages(&current, &mut average);
        out.points = current;
        out.points.append(&mut average);
        out.points.append(&mut marker_points);
        out.diagnostics.sort_by_key(|d| d.index);
        out
    }

    fn normalize_tick(&self, tick: &MinuteTick) -> Result<NormalizedTime, RecordError> {
        self.normalize_series_value(&tick.timestamp, tick.current_price)
    }

    fn normalize_series_value(
        &self,
        timestamp: &RawTimestamp,
        value: f64,
    ) -> Result<NormalizedTime, RecordError> {
        check_price("price", value)?;
        self.normalizer.normalize(timestamp)
    }

    fn marker_point(&self, marker: &OrderMarker) -> Result<ChartPoint, RecordError> {
        check_price("marker price", marker.price)?;
        let time = self.normalizer.normalize(&marker.timestamp)?;
        let identity = marker_identity(marker.order_number_trimmed(), marker.side, time.instant_ms);
        let detail = MarkerDetail {
            quantity: marker.quantity,
            filled_quantity: marker.filled_quantity,
            account_label: marker.account_label.clone(),
            annotation: marker.annotation.clone(),
        };
        let point = ChartPoint::marker(marker.side, identity, &time.label, time.instant_ms, marker.price);
        if detail == MarkerDetail::default() {
            Ok(point)
        } else {
            Ok(point.with_detail(detail))
        }
    }
}

fn check_price(field: &'static str, value: f64) -> Result<(), RecordError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RecordError::InvalidPrice { field, value })
    }
}
