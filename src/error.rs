/// All errors that can occur while fetching or streaming match data.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// The backend does not know the requested match.
    #[error("match not found: {url}")]
    NotFound { url: String },

    /// A payload was not valid JSON.
    #[error("malformed {context}: {source}")]
    Json {
        context: &'static str,
        source: serde_json::Error,
    },

    /// A payload was valid JSON but not in any recognised shape.
    #[error("malformed {context}: {reason}")]
    Format {
        context: &'static str,
        reason: String,
    },

    /// The streaming handshake never completed.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// The stream was established and then failed.
    #[error("stream error: {0}")]
    Channel(String),

    /// The stream was closed by either side.
    #[error("stream closed")]
    ChannelClosed,
}

impl SyncError {
    /// The match id is unknown to the backend. Never worth retrying.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    /// Network-level failure of a request/response exchange.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Transport { .. }
                | SyncError::UnexpectedStatus { .. }
                | SyncError::ResponseBody { .. }
        )
    }

    /// The payload could not be understood.
    pub fn is_format(&self) -> bool {
        matches!(self, SyncError::Json { .. } | SyncError::Format { .. })
    }

    pub(crate) fn format(context: &'static str, reason: impl Into<String>) -> Self {
        SyncError::Format {
            context,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
