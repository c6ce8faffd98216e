use serde_json::json;

use autotrade_chart::backend::types::MinuteDataPayload;
use autotrade_chart::chart::{RecordKind, Reconciler};
use autotrade_chart::error::{ChartError, RecordError};
use autotrade_chart::model::point::SeriesRole;

#[test]
/// Verifies the structured payload inside the admin API envelope decodes with
/// field aliases and string-encoded numbers.
fn structured_payload_in_envelope() {
    let body = json!({
        "code": 200,
        "msg": "ok",
        "data": {
            "minuteData": [
                {"time": "2024-01-02 09:30:00", "price": "100.00", "avgPrice": 99.5},
                {"time": "2024-01-02 09:31:00", "price": 100.4}
            ],
            "tradePoints": [
                {"tradeTime": 1704159060000_i64, "price": "100.30", "pointType": "买入",
                 "orderNo": 880012, "qty": 200, "accountName": "main", "remark": "grid"}
            ]
        }
    });
    let out = Reconciler::default().reconcile_json(&body).unwrap();

    assert_eq!(out.points.len(), 5);
    let avg: Vec<f64> = out.series(SeriesRole::AveragePrice).map(|p| p.value).collect();
    assert_eq!(avg, vec![99.5, 100.4 * 0.95]);

    let marker = out.markers().next().unwrap();
    assert_eq!(marker.series_role, SeriesRole::BuyMarker);
    assert_eq!(marker.identity.as_ref().unwrap().as_str(), "880012");
    assert_eq!(marker.time_label, "01-02 09:31");
    let detail = marker.detail.as_ref().unwrap();
    assert_eq!(detail.quantity, Some(200.0));
    assert_eq!(detail.account_label.as_deref(), Some("main"));
    assert_eq!(detail.annotation.as_deref(), Some("grid"));
}

#[test]
/// Verifies a bare top-level array is treated as the legacy free-text shape.
fn bare_array_is_legacy() {
    let body = json!([
        {"time": "2024-01-02 09:30:00", "value": 100.0, "type": "当前价"},
        {"time": "2024-01-02 09:30:00", "value": 99.0, "type": "均价"}
    ]);
    let payload = MinuteDataPayload::from_value(&body).unwrap();
    assert!(matches!(payload, MinuteDataPayload::Legacy { .. }));

    let out = Reconciler::default().reconcile_payload(&payload);
    assert_eq!(out.points.len(), 2);
    assert_eq!(out.synthesized_averages, 0);
}

#[test]
/// Verifies elements that fail to decode become diagnostics indexed by their
/// position in the wire array, and the rest of the batch survives.
fn undecodable_elements_become_diagnostics() {
    let body = json!({
        "ticks": [
            {"timestamp": "2024-01-02T09:30:00", "currentPrice": 10.0},
            {"timestamp": "2024-01-02T09:31:00"},
            {"timestamp": "garbage", "currentPrice": 10.2},
            {"timestamp": "2024-01-02T09:33:00", "currentPrice": 10.3}
        ],
        "markers": [
            {"timestamp": "2024-01-02T09:31:00", "price": 10.1, "side": "hold"},
            {"timestamp": "2024-01-02T09:33:00", "price": 10.3, "side": "sell"}
        ]
    });
    let out = Reconciler::default().reconcile_json(&body).unwrap();

    assert_eq!(out.points.len(), 2 * 2 + 1);
    let summary: Vec<(RecordKind, usize)> = out.diagnostics.iter().map(|d| (d.kind, d.index)).collect();
    assert_eq!(
        summary,
        vec![(RecordKind::Tick, 1), (RecordKind::Tick, 2), (RecordKind::Marker, 0)]
    );
    assert_eq!(out.diagnostics[0].error, RecordError::MissingField("currentPrice"));
    assert!(matches!(out.diagnostics[1].error, RecordError::InvalidTimestamp(_)));
    assert_eq!(out.diagnostics[2].error, RecordError::UnknownSide("hold".to_string()));
}

#[test]
/// Verifies an envelope with no points and empty arrays reconciles to nothing.
fn empty_collections_are_empty_result() {
    let body = json!({"code": 0, "data": {"ticks": [], "markers": []}});
    let out = Reconciler::default().reconcile_json(&body).unwrap();
    assert!(out.is_empty());
}

#[test]
/// Verifies structural problems are hard errors: wrong top-level type, a
/// collection that is not an array, or no known collection at all.
fn structural_errors_are_raised() {
    let r = Reconciler::default();
    for body in [
        json!("hello"),
        json!(42),
        json!({"ticks": {"a": 1}}),
        json!({"unrelated": []}),
        json!({"code": 200, "data": null}),
    ] {
        let err = r.reconcile_json(&body).unwrap_err();
        assert!(matches!(err, ChartError::Structural(_)), "{body}: {err}");
    }
}

#[test]
/// Verifies a non-success envelope code surfaces the backend message.
fn backend_error_code_is_reported() {
    let body = json!({"code": 500, "msg": "stock not found", "data": {}});
    match Reconciler::default().reconcile_json(&body) {
        Err(ChartError::Backend { code, msg }) => {
            assert_eq!(code, 500);
            assert_eq!(msg, "stock not found");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
/// Verifies a legacy element with a null `type` is counted as unclassified
/// rather than reported as malformed, unless `pointType` names a side.
fn null_legacy_tag_is_unclassified() {
    let body = json!([
        {"time": "2024-01-02 09:30:00", "value": 100.0, "type": "当前价"},
        {"time": "2024-01-02 09:30:00", "value": 7.0, "type": null},
        {"time": "2024-01-02 09:30:00", "value": 100.5, "type": null, "pointType": "buy", "orderNo": 42}
    ]);
    let out = Reconciler::default().reconcile_json(&body).unwrap();
    assert!(out.diagnostics.is_empty());
    assert_eq!(out.unclassified, 1);
    assert_eq!(out.series(SeriesRole::BuyMarker).count(), 1);
    assert_eq!(out.series(SeriesRole::CurrentPrice).count(), 1);
}
