//! In-memory stand-ins for the network collaborators.

use std::collections::VecDeque;
use std::future::pending;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use super::snapshot::SnapshotFetcher;
use super::stream::{StreamConnector, UpdateChannel};
use crate::error::{Result, SyncError};
use crate::live::LiveMatch;
use crate::model::{ConnectionState, MatchUpdate};

pub(crate) type Feed = mpsc::UnboundedSender<Result<String>>;

enum Outcome {
    Accept(mpsc::UnboundedReceiver<Result<String>>),
    Hang,
}

#[derive(Default)]
struct ConnectorState {
    outcomes: VecDeque<Outcome>,
    opens: usize,
    closes: usize,
    live_channels: usize,
}

/// Fails every `open` unless an outcome was queued.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl FakeConnector {
    /// Let the next `open` succeed; the returned sender feeds the channel.
    pub(crate) fn accept_next(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .unwrap()
            .outcomes
            .push_back(Outcome::Accept(rx));
        tx
    }

    /// Make the next `open` never complete.
    pub(crate) fn hang_next(&self) {
        self.state.lock().unwrap().outcomes.push_back(Outcome::Hang);
    }

    pub(crate) fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    /// Channels closed through `UpdateChannel::close`.
    pub(crate) fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    /// Channels opened and not yet dropped.
    pub(crate) fn live_channels(&self) -> usize {
        self.state.lock().unwrap().live_channels
    }
}

impl StreamConnector for FakeConnector {
    type Channel = FakeChannel;

    async fn open(&self, match_id: &str) -> Result<FakeChannel> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.opens += 1;
            state.outcomes.pop_front()
        };
        match outcome {
            Some(Outcome::Accept(feed)) => {
                self.state.lock().unwrap().live_channels += 1;
                Ok(FakeChannel {
                    feed,
                    state: self.state.clone(),
                })
            }
            Some(Outcome::Hang) => pending().await,
            None => Err(SyncError::ConnectFailed {
                url: format!("ws://fake/{match_id}"),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

pub(crate) struct FakeChannel {
    feed: mpsc::UnboundedReceiver<Result<String>>,
    state: Arc<Mutex<ConnectorState>>,
}

impl UpdateChannel for FakeChannel {
    async fn next_payload(&mut self) -> Result<String> {
        self.feed.recv().await.unwrap_or(Err(SyncError::ChannelClosed))
    }

    async fn close(self) {
        self.state.lock().unwrap().closes += 1;
    }
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        self.state.lock().unwrap().live_channels -= 1;
    }
}

#[derive(Default)]
struct FetcherState {
    responses: VecDeque<Result<MatchUpdate>>,
    calls: usize,
    gate: Option<Arc<Notify>>,
}

/// Answers with queued responses, then with empty snapshots.
#[derive(Clone, Default)]
pub(crate) struct FakeFetcher {
    state: Arc<Mutex<FetcherState>>,
}

impl FakeFetcher {
    pub(crate) fn respond(&self, response: Result<MatchUpdate>) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    /// Block every fetch until the returned gate is notified.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().gate = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl SnapshotFetcher for FakeFetcher {
    async fn fetch_snapshot(&self, _match_id: &str) -> Result<MatchUpdate> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .unwrap()
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(MatchUpdate::default()))
    }
}

pub(crate) async fn wait_for_state(live: &LiveMatch, state: ConnectionState) {
    let mut status = live.watch_subscription();
    tokio::time::timeout(
        Duration::from_secs(3600),
        status.wait_for(|s| s.connection_state == state),
    )
    .await
    .expect("state not reached")
    .expect("supervisor gone");
}
