use std::future::pending;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::model::{MatchViewModel, Subscription, TransientEvent};

/// Producer half of the view model publisher, owned by the supervisor.
///
/// Consumers only ever see clones through the matching [`Receivers`].
pub(crate) struct Publisher {
    view: watch::Sender<MatchViewModel>,
    status: watch::Sender<Subscription>,
    events: broadcast::Sender<TransientEvent>,
    window: Duration,
    event_expires_at: Option<Instant>,
}

pub(crate) struct Receivers {
    pub view: watch::Receiver<MatchViewModel>,
    pub status: watch::Receiver<Subscription>,
    pub events: broadcast::Receiver<TransientEvent>,
}

impl Publisher {
    pub(crate) fn new(
        model: MatchViewModel,
        subscription: Subscription,
        window: Duration,
        buffer: usize,
    ) -> (Self, Receivers) {
        let (view, view_rx) = watch::channel(model);
        let (status, status_rx) = watch::channel(subscription);
        let (events, events_rx) = broadcast::channel(buffer.max(1));
        let publisher = Self {
            view,
            status,
            events,
            window,
            event_expires_at: None,
        };
        let receivers = Receivers {
            view: view_rx,
            status: status_rx,
            events: events_rx,
        };
        (publisher, receivers)
    }

    pub(crate) fn publish(&self, model: &MatchViewModel) {
        self.view.send_replace(model.clone());
    }

    pub(crate) fn publish_status(&self, subscription: &Subscription) {
        self.status.send_replace(subscription.clone());
    }

    /// Notify listeners and (re)start the display window.
    pub(crate) fn announce(&mut self, event: TransientEvent) {
        self.event_expires_at = Some(Instant::now() + self.window);
        if self.events.send(event).is_err() {
            trace!("no event listeners");
        }
    }

    pub(crate) fn event_expires_at(&self) -> Option<Instant> {
        self.event_expires_at
    }

    /// Drop the event marker once its display window is over.
    pub(crate) fn expire_event(&mut self, model: &mut MatchViewModel) {
        self.event_expires_at = None;
        if let Some(kind) = model.last_event.take() {
            trace!(%kind, "event display window over");
            self.publish(model);
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub(crate) async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
