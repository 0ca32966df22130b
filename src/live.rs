use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::model::{ConnectionState, MatchViewModel, Subscription, TransientEvent};
use crate::sync::publisher::Publisher;
use crate::sync::snapshot::SnapshotFetcher;
use crate::sync::stream::StreamConnector;
use crate::sync::supervisor::Supervisor;

/// A live, self-updating view of one match.
///
/// Owns the background task that streams (or polls) updates. Reads always
/// return copies, so a renderer never observes a half-merged state. Dropping
/// the handle tears the subscription down just like
/// [`unsubscribe`](LiveMatch::unsubscribe), without waiting for it.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> cricket_live::Result<()> {
/// use cricket_live::CricketClient;
///
/// let client = CricketClient::new();
/// let mut live = client.subscribe("96612").await?;
/// let mut events = live.events();
/// while let Ok(event) = events.recv().await {
///     let view = live.current();
///     println!("{}! {} ({})", event.kind, view.score, live.connection_state());
/// }
/// live.unsubscribe().await;
/// # Ok(())
/// # }
/// ```
pub struct LiveMatch {
    match_id: String,
    view: watch::Receiver<MatchViewModel>,
    status: watch::Receiver<Subscription>,
    events: broadcast::Receiver<TransientEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveMatch {
    /// Start synchronizing `match_id` from `fetcher` and `connector`.
    ///
    /// Without an `initial` view model a seed snapshot is fetched first. An
    /// unknown match fails here, before any connection or timer is started;
    /// other seed failures are logged and the view starts empty.
    #[instrument(skip(config, fetcher, connector, initial))]
    pub async fn start<F, C>(
        config: SyncConfig,
        fetcher: F,
        connector: C,
        match_id: &str,
        initial: Option<MatchViewModel>,
    ) -> Result<Self>
    where
        F: SnapshotFetcher,
        C: StreamConnector,
    {
        let mut model = match initial {
            Some(model) => model,
            None => seed(&fetcher, match_id).await?,
        };
        model.match_id = match_id.to_owned();
        // Markers in a seed are stale.
        model.last_event = None;

        let (publisher, receivers) = Publisher::new(
            model.clone(),
            Subscription::new(match_id),
            config.event_display_window,
            config.event_buffer,
        );
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let supervisor = Supervisor::new(config, fetcher, connector, model, publisher, shutdown_rx);
        let task = tokio::spawn(supervisor.run());

        Ok(Self {
            match_id: match_id.to_owned(),
            view: receivers.view,
            status: receivers.status,
            events: receivers.events,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// A copy of the current view model.
    pub fn current(&self) -> MatchViewModel {
        self.view.borrow().clone()
    }

    /// Change notifications for the view model.
    pub fn watch(&self) -> watch::Receiver<MatchViewModel> {
        self.view.clone()
    }

    /// Transient events published from now on.
    pub fn events(&self) -> broadcast::Receiver<TransientEvent> {
        self.events.resubscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.status.borrow().connection_state
    }

    pub fn subscription(&self) -> Subscription {
        self.status.borrow().clone()
    }

    pub fn watch_subscription(&self) -> watch::Receiver<Subscription> {
        self.status.clone()
    }

    /// Stop all updates and release the connection or poll timer.
    ///
    /// Any snapshot still in flight is dropped unmerged. Calling this again is
    /// a no-op.
    pub async fn unsubscribe(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        if shutdown.send(()).is_err() {
            debug!(match_id = %self.match_id, "supervisor already stopped");
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(match_id = %self.match_id, error = %e, "supervisor task failed");
            }
        }
    }
}

async fn seed<F: SnapshotFetcher>(fetcher: &F, match_id: &str) -> Result<MatchViewModel> {
    let mut model = MatchViewModel::new(match_id);
    match fetcher.fetch_snapshot(match_id).await {
        Ok(update) => {
            model.apply(&update);
        }
        Err(e) if e.is_not_found() => return Err(e),
        Err(e) => warn!(error = %e, "seed snapshot unavailable, starting empty"),
    }
    Ok(model)
}
