//! Connection lifecycle for one match subscription.
//!
//! ```text
//! Idle -> Connecting -> Streaming
//!             |             |
//!             +--> Polling <+        (any) -> Closed
//! ```
//!
//! The supervisor runs as a single task and handles one event at a time. The
//! open channel only exists while streaming and the poll ticker only while
//! polling, so the two sources can never deliver concurrently.

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::normalize;
use super::publisher::{wait_until, Publisher};
use super::snapshot::SnapshotFetcher;
use super::stream::{StreamConnector, UpdateChannel};
use crate::config::{SyncConfig, MIN_POLL_INTERVAL};
use crate::model::{ConnectionState, MatchUpdate, MatchViewModel, Subscription};

enum Phase<Ch> {
    Connecting,
    Streaming(Ch),
    Polling,
    Closed,
}

pub(crate) struct Supervisor<F, C> {
    config: SyncConfig,
    fetcher: F,
    connector: C,
    model: MatchViewModel,
    subscription: Subscription,
    publisher: Publisher,
    shutdown: oneshot::Receiver<()>,
}

impl<F, C> Supervisor<F, C>
where
    F: SnapshotFetcher,
    C: StreamConnector,
{
    pub(crate) fn new(
        config: SyncConfig,
        fetcher: F,
        connector: C,
        model: MatchViewModel,
        publisher: Publisher,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        let subscription = Subscription::new(model.match_id.as_str());
        Self {
            config,
            fetcher,
            connector,
            model,
            subscription,
            publisher,
            shutdown,
        }
    }

    /// Drive the state machine until the subscription is closed.
    ///
    /// Dropping the shutdown sender counts as a close request.
    #[instrument(name = "supervisor", skip_all, fields(match_id = %self.subscription.match_id))]
    pub(crate) async fn run(mut self) {
        let mut phase = Phase::Connecting;
        loop {
            phase = match phase {
                Phase::Connecting => self.connect().await,
                Phase::Streaming(channel) => self.stream(channel).await,
                Phase::Polling => self.poll().await,
                Phase::Closed => break,
            };
        }
        self.transition(ConnectionState::Closed);
    }

    async fn connect(&mut self) -> Phase<C::Channel> {
        self.transition(ConnectionState::Connecting);

        let timeout = self.config.connect_timeout;
        let opened = {
            let open = time::timeout(timeout, self.connector.open(&self.subscription.match_id));
            tokio::pin!(open);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut self.shutdown => return Phase::Closed,
                    _ = wait_until(self.publisher.event_expires_at()) => {
                        self.publisher.expire_event(&mut self.model);
                    }
                    opened = &mut open => break opened,
                }
            }
        };

        match opened {
            Ok(Ok(channel)) => {
                self.subscription.retry_count = 0;
                Phase::Streaming(channel)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "stream unavailable, falling back to polling");
                Phase::Polling
            }
            Err(_) => {
                warn!(?timeout, "stream handshake timed out, falling back to polling");
                Phase::Polling
            }
        }
    }

    async fn stream(&mut self, mut channel: C::Channel) -> Phase<C::Channel> {
        self.transition(ConnectionState::Streaming);

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    if time::timeout(self.config.connect_timeout, channel.close()).await.is_err() {
                        debug!("unsubscribe timed out");
                    }
                    return Phase::Closed;
                }
                _ = wait_until(self.publisher.event_expires_at()) => {
                    self.publisher.expire_event(&mut self.model);
                }
                payload = channel.next_payload() => match payload {
                    Ok(raw) => self.apply_raw(&raw),
                    Err(e) => {
                        warn!(error = %e, "stream lost, falling back to polling");
                        return Phase::Polling;
                    }
                },
            }
        }
    }

    async fn poll(&mut self) -> Phase<C::Channel> {
        self.transition(ConnectionState::Polling);

        let mut ticker = time::interval(self.config.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let reconnect_at = self.reconnect_deadline();

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => return Phase::Closed,
                _ = wait_until(self.publisher.event_expires_at()) => {
                    self.publisher.expire_event(&mut self.model);
                }
                _ = wait_until(reconnect_at) => {
                    self.subscription.retry_count += 1;
                    info!(attempt = self.subscription.retry_count, "retrying stream");
                    return Phase::Connecting;
                }
                _ = ticker.tick() => {
                    // A response that loses the race against shutdown is dropped unmerged.
                    let fetched = tokio::select! {
                        biased;
                        _ = &mut self.shutdown => return Phase::Closed,
                        fetched = self.fetcher.fetch_snapshot(&self.subscription.match_id) => fetched,
                    };
                    match fetched {
                        Ok(update) => self.apply(update),
                        Err(e) => warn!(error = %e, "poll failed, retrying next tick"),
                    }
                }
            }
        }
    }

    fn reconnect_deadline(&self) -> Option<Instant> {
        let policy = self.config.reconnect.as_ref()?;
        if self.subscription.retry_count >= policy.max_attempts {
            debug!(
                attempts = self.subscription.retry_count,
                "reconnect attempts exhausted, staying on polling"
            );
            return None;
        }
        Some(Instant::now() + policy.delay_for(self.subscription.retry_count))
    }

    fn apply_raw(&mut self, raw: &str) {
        match normalize::parse_update(raw) {
            Ok(update) => self.apply(update),
            Err(e) => warn!(error = %e, "discarding malformed update"),
        }
    }

    fn apply(&mut self, update: MatchUpdate) {
        if let Some(other) = update
            .match_id
            .as_deref()
            .filter(|id| *id != self.subscription.match_id)
        {
            debug!(other, "ignoring update for another match");
            return;
        }

        let event = self.model.apply(&update);
        self.subscription.last_updated_at = Some(Utc::now());
        self.publisher.publish(&self.model);
        self.publisher.publish_status(&self.subscription);
        if let Some(event) = event {
            info!(kind = %event.kind, "match event");
            self.publisher.announce(event);
        }
    }

    fn transition(&mut self, state: ConnectionState) {
        self.subscription.connection_state = state;
        info!(%state, "connection state changed");
        self.publisher.publish_status(&self.subscription);
    }
}
