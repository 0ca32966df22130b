use chrono::{DateTime, Utc};
use serde::Serialize;

/// A short-lived match moment (wicket, boundary, ...) worth celebrating.
///
/// Fires on every merge that carries an event marker. Consumers that want at
/// most one celebration per moment deduplicate on `(kind, at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransientEvent {
    pub kind: String,
    pub at: DateTime<Utc>,
}
