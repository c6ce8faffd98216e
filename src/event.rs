use serde_json::Value;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Raw minute-data response for the fetch numbered `seq`.
    MinuteData { seq: u64, payload: Value },
    FetchFailed { seq: u64, error: String },
    LogMessage(String),
}
