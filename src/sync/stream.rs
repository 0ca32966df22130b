use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::{ControlKey, SyncConfig};
use crate::error::{Result, SyncError};

/// Placeholder in [`SyncConfig::ws_url`] replaced by the match id, for
/// backends that expose one socket path per match.
pub const MATCH_ID_PLACEHOLDER: &str = "{match_id}";

/// Opens push channels for a match.
///
/// Every call to [`open`](StreamConnector::open) yields a fresh channel that is
/// already subscribed.
pub trait StreamConnector: Send + Sync + 'static {
    type Channel: UpdateChannel;

    /// Fails with [`SyncError::ConnectFailed`] when the channel cannot be
    /// established.
    fn open(&self, match_id: &str) -> impl Future<Output = Result<Self::Channel>> + Send;
}

/// An established, subscribed push channel.
pub trait UpdateChannel: Send + 'static {
    /// Wait for the next raw payload.
    ///
    /// Errors are terminal: [`SyncError::Channel`] after a failure,
    /// [`SyncError::ChannelClosed`] after a close by either side.
    fn next_payload(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Unsubscribe (best effort) and close.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlVerb {
    Subscribe,
    Unsubscribe,
    SubscribeCommentary,
    UnsubscribeCommentary,
}

/// A subscribe/unsubscribe message in either of the two wire forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<ControlVerb>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<ControlVerb>,
    match_id: String,
}

impl ControlMessage {
    pub fn new(key: ControlKey, verb: ControlVerb, match_id: impl Into<String>) -> Self {
        let (action, kind) = match key {
            ControlKey::Action => (Some(verb), None),
            ControlKey::Type => (None, Some(verb)),
        };
        Self {
            action,
            kind,
            match_id: match_id.into(),
        }
    }

    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SyncError::Json {
            context: "control message",
            source: e,
        })
    }
}

/// [`StreamConnector`] over a WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    control_key: ControlKey,
    commentary: bool,
}

impl WsConnector {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            control_key: config.control_key,
            commentary: config.subscribe_commentary,
        }
    }
}

impl StreamConnector for WsConnector {
    type Channel = WsChannel;

    async fn open(&self, match_id: &str) -> Result<WsChannel> {
        let url = self.url.replace(MATCH_ID_PLACEHOLDER, match_id);
        debug!(%url, match_id, "opening stream");

        let (socket, _response) = connect_async(url.as_str()).await.map_err(|e| {
            SyncError::ConnectFailed {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut channel = WsChannel {
            socket,
            match_id: match_id.to_owned(),
            control_key: self.control_key,
            commentary: self.commentary,
        };
        for verb in channel.verbs(ControlVerb::Subscribe, ControlVerb::SubscribeCommentary) {
            channel
                .send(verb)
                .await
                .map_err(|e| SyncError::ConnectFailed {
                    url: url.clone(),
                    reason: format!("subscribe not sent: {e}"),
                })?;
        }

        info!(%url, match_id, "stream subscribed");
        Ok(channel)
    }
}

/// A subscribed WebSocket.
pub struct WsChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    match_id: String,
    control_key: ControlKey,
    commentary: bool,
}

impl WsChannel {
    fn verbs(&self, main: ControlVerb, commentary: ControlVerb) -> Vec<ControlVerb> {
        if self.commentary {
            vec![main, commentary]
        } else {
            vec![main]
        }
    }

    async fn send(&mut self, verb: ControlVerb) -> Result<()> {
        let text = ControlMessage::new(self.control_key, verb, self.match_id.as_str()).to_text()?;
        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| SyncError::Channel(e.to_string()))
    }
}

impl UpdateChannel for WsChannel {
    async fn next_payload(&mut self) -> Result<String> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(text),
                    Err(_) => debug!("skipping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "stream closed by server");
                    return Err(SyncError::ChannelClosed);
                }
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Err(SyncError::ChannelClosed)
                }
                Some(Err(e)) => return Err(SyncError::Channel(e.to_string())),
            }
        }
    }

    async fn close(mut self) {
        for verb in self.verbs(ControlVerb::Unsubscribe, ControlVerb::UnsubscribeCommentary) {
            if let Err(e) = self.send(verb).await {
                debug!(error = %e, "unsubscribe not delivered");
                break;
            }
        }
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "stream close failed");
        }
    }
}
