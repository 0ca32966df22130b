use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the live updates of a subscription currently come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Nothing opened yet.
    Idle,
    Connecting,
    /// Push channel delivering updates. Show as "live".
    Streaming,
    /// Pull fallback after the push channel failed. Show as degraded.
    Polling,
    /// Torn down. Final.
    Closed,
}

/// Bookkeeping for one match subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub match_id: String,
    pub connection_state: ConnectionState,
    /// Reconnect attempts made since the stream last failed.
    pub retry_count: u32,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            connection_state: ConnectionState::Idle,
            retry_count: 0,
            last_updated_at: None,
        }
    }
}
