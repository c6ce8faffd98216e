use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::BackendConfig;
use crate::error::ChartError;
use crate::event::AppEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteDataQuery {
    pub stock_code: String,
    pub trade_date: Option<NaiveDate>,
}

impl MinuteDataQuery {
    pub fn new(stock_code: &str) -> Self {
        Self {
            stock_code: stock_code.trim().to_string(),
            trade_date: None,
        }
    }

    pub fn on(mut self, trade_date: NaiveDate) -> Self {
        self.trade_date = Some(trade_date);
        self
    }
}

/// Anything that can produce a raw minute-data response.
pub trait MinuteDataSource {
    fn fetch_minute_data(
        &self,
        query: &MinuteDataQuery,
    ) -> impl Future<Output = Result<Value>> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i64,
    #[serde(alias = "message", default)]
    msg: String,
}

pub struct MinuteDataClient {
    http: reqwest::Client,
    base_url: String,
    minute_data_path: String,
    api_token: Option<String>,
}

impl MinuteDataClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            minute_data_path: config.minute_data_path.clone(),
            api_token: config.api_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn minute_data_url(&self, query: &MinuteDataQuery) -> Result<Url> {
        let path = if self.minute_data_path.starts_with('/') {
            self.minute_data_path.clone()
        } else {
            format!("/{}", self.minute_data_path)
        };
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .with_context(|| format!("invalid minute-data url '{}{}'", self.base_url, path))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("stockCode", &query.stock_code);
            if let Some(date) = query.trade_date {
                pairs.append_pair("tradeDate", &date.format("%Y-%m-%d").to_string());
            }
        }
        Ok(url)
    }

    async fn get_minute_data(&self, query: &MinuteDataQuery) -> Result<Value> {
        let url = self.minute_data_url(query)?;
        tracing::debug!(url = %url, "Fetching minute data");

        let mut req = self.http.get(url);
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.context("minute data HTTP failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ChartError::Backend {
                    code: err.code,
                    msg: err.msg,
                }
                .into());
            }
            return Err(anyhow::anyhow!(
                "minute data request failed ({}): {}",
                status,
                body
            ));
        }

        resp.json::<Value>()
            .await
            .context("minute data response was not JSON")
    }
}

impl MinuteDataSource for MinuteDataClient {
    fn fetch_minute_data(
        &self,
        query: &MinuteDataQuery,
    ) -> impl Future<Output = Result<Value>> + Send {
        self.get_minute_data(query)
    }
}

/// Run one fetch and wrap the outcome as an event tagged with `seq`.
pub async fn fetch_event<S>(source: &S, query: &MinuteDataQuery, seq: u64) -> AppEvent
where
    S: MinuteDataSource,
{
    match source.fetch_minute_data(query).await {
        Ok(payload) => AppEvent::MinuteData { seq, payload },
        Err(e) => {
            tracing::warn!(seq, stock_code = %query.stock_code, error = %e, "Minute data fetch failed");
            AppEvent::FetchFailed {
                seq,
                error: format!("{:#}", e),
            }
        }
    }
}

/// Fetch in the background and post the result to the UI loop. Earlier
/// fetches are not cancelled; the session discards stale results by `seq`.
pub fn spawn_fetch<S>(
    source: Arc<S>,
    query: MinuteDataQuery,
    seq: u64,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()>
where
    S: MinuteDataSource + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let event = fetch_event(source.as_ref(), &query, seq).await;
        if tx.send(event).await.is_err() {
            tracing::debug!(seq, "Event channel closed before fetch completed");
        }
    })
}
