use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use autotrade_chart::backend::rest::{fetch_event, spawn_fetch, MinuteDataQuery, MinuteDataSource};
use autotrade_chart::chart::Reconciler;
use autotrade_chart::event::AppEvent;
use autotrade_chart::ui::AppState;

struct StubSource {
    response: Option<Value>,
}

impl MinuteDataSource for StubSource {
    fn fetch_minute_data(&self, query: &MinuteDataQuery) -> impl Future<Output = Result<Value>> + Send {
        let response = self.response.clone();
        let code = query.stock_code.clone();
        async move { response.ok_or_else(|| anyhow::anyhow!("backend unreachable for {}", code)) }
    }
}

#[test]
/// Verifies a successful fetch is wrapped with its sequence number.
fn fetch_event_wraps_payload() {
    let source = StubSource {
        response: Some(json!({"ticks": []})),
    };
    let event = tokio_test::block_on(fetch_event(&source, &MinuteDataQuery::new("600519"), 7));
    match event {
        AppEvent::MinuteData { seq, payload } => {
            assert_eq!(seq, 7);
            assert_eq!(payload, json!({"ticks": []}));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
/// Verifies a failed fetch becomes a FetchFailed event, not an error.
fn fetch_event_reports_failure() {
    let source = StubSource { response: None };
    let event = tokio_test::block_on(fetch_event(&source, &MinuteDataQuery::new("000001"), 3));
    match event {
        AppEvent::FetchFailed { seq, error } => {
            assert_eq!(seq, 3);
            assert!(error.contains("000001"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
/// Verifies the spawned fetch posts to the UI channel and the app state
/// applies it through the session.
fn spawned_fetch_reaches_app_state() {
    let source = Arc::new(StubSource {
        response: Some(json!({
            "ticks": [{"timestamp": "2024-01-02T09:30:00", "currentPrice": 20.0}],
            "markers": []
        })),
    });
    let mut state = AppState::new("600519", Reconciler::default());
    let seq = state.session.begin_fetch();

    let event = tokio_test::block_on(async {
        let (tx, mut rx) = mpsc::channel(4);
        spawn_fetch(source, MinuteDataQuery::new("600519"), seq, tx)
            .await
            .expect("fetch task should not panic");
        rx.recv().await
    })
    .expect("event should be posted");

    state.apply(event);
    assert!(!state.session.loading());
    assert_eq!(state.session.current().points.len(), 2);
    assert!(state.log_messages.last().unwrap().contains("loaded 2 points"));
}
