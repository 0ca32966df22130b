use tracing::{instrument, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::live::LiveMatch;
use crate::model::*;
use crate::sync::snapshot::{self, SnapshotFetcher};
use crate::sync::stream::WsConnector;

/// The main entry point for following cricket matches.
///
/// `CricketClient` wraps a [`reqwest::Client`] and a [`SyncConfig`] and
/// exposes one-shot fetches as well as live subscriptions that stream over
/// WebSocket and fall back to polling.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> cricket_live::Result<()> {
/// use cricket_live::CricketClient;
///
/// let client = CricketClient::new();
/// for summary in client.list_matches().await? {
///     println!("{}: {} {}", summary.match_id, summary.teams, summary.score);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CricketClient {
    http: reqwest::Client,
    config: SyncConfig,
}

impl CricketClient {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Create a new client for `config`, applying its request timeout.
    pub fn with_config(config: SyncConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to a default http client");
                reqwest::Client::new()
            });
        Self { http, config }
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, config: SyncConfig) -> Self {
        Self {
            http: client,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetch one snapshot and build a view model from it.
    #[instrument(skip(self))]
    pub async fn get_match(&self, match_id: &str) -> Result<MatchViewModel> {
        let update = self.fetch_snapshot(match_id).await?;
        let mut model = MatchViewModel::new(match_id);
        model.apply(&update);
        Ok(model)
    }

    /// Fetch one snapshot as a partial update.
    #[instrument(skip(self))]
    pub async fn get_snapshot(&self, match_id: &str) -> Result<MatchUpdate> {
        snapshot::get_snapshot(&self.http, &self.config, match_id).await
    }

    /// Fetch the ball-by-ball commentary of a match.
    #[instrument(skip(self))]
    pub async fn get_commentary(&self, match_id: &str) -> Result<Vec<String>> {
        snapshot::get_commentary(&self.http, &self.config, match_id).await
    }

    /// Fetch the list of matches the backend knows about.
    #[instrument(skip(self))]
    pub async fn list_matches(&self) -> Result<Vec<MatchSummary>> {
        snapshot::get_match_list(&self.http, &self.config).await
    }

    /// Start a live subscription, seeded from a fresh snapshot.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, match_id: &str) -> Result<LiveMatch> {
        self.subscribe_with(match_id, None).await
    }

    /// Start a live subscription from a view model the caller already has.
    #[instrument(skip(self, initial))]
    pub async fn subscribe_with(
        &self,
        match_id: &str,
        initial: Option<MatchViewModel>,
    ) -> Result<LiveMatch> {
        LiveMatch::start(
            self.config.clone(),
            self.clone(),
            WsConnector::new(&self.config),
            match_id,
            initial,
        )
        .await
    }
}

impl SnapshotFetcher for CricketClient {
    async fn fetch_snapshot(&self, match_id: &str) -> Result<MatchUpdate> {
        let mut update = self.get_snapshot(match_id).await?;
        if self.config.poll_commentary && update.commentary.is_none() {
            match self.get_commentary(match_id).await {
                Ok(lines) => update.commentary = MatchUpdate::commentary(lines).commentary,
                Err(e) => warn!(error = %e, "commentary unavailable"),
            }
        }
        Ok(update)
    }
}

impl Default for CricketClient {
    fn default() -> Self {
        Self::new()
    }
}
