use std::future::Future;

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use tracing::debug;

use super::normalize;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::model::{MatchSummary, MatchUpdate};

/// Pull source for full match snapshots.
///
/// Implementations perform exactly one request per call and never touch the
/// view model; the supervisor merges whatever they return.
pub trait SnapshotFetcher: Send + Sync + 'static {
    fn fetch_snapshot(&self, match_id: &str) -> impl Future<Output = Result<MatchUpdate>> + Send;
}

/// GET `url` with caching disabled and return the body text.
///
/// A 404 becomes [`SyncError::NotFound`].
pub(crate) async fn get_fresh(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!(url, "fetching");

    let response = client
        .get(url)
        .header(CACHE_CONTROL, "no-cache, no-store")
        .header(PRAGMA, "no-cache")
        .send()
        .await
        .map_err(|e| SyncError::Transport {
            url: url.to_owned(),
            source: e,
        })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(SyncError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    response.text().await.map_err(|e| SyncError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })
}

pub(crate) async fn get_snapshot(
    client: &reqwest::Client,
    config: &SyncConfig,
    match_id: &str,
) -> Result<MatchUpdate> {
    let url = config.match_url(match_id);
    let body = get_fresh(client, &url).await?;
    normalize::parse_snapshot(&body, &url)
}

pub(crate) async fn get_commentary(
    client: &reqwest::Client,
    config: &SyncConfig,
    match_id: &str,
) -> Result<Vec<String>> {
    let body = get_fresh(client, &config.commentary_url(match_id)).await?;
    normalize::parse_commentary(&body)
}

pub(crate) async fn get_match_list(
    client: &reqwest::Client,
    config: &SyncConfig,
) -> Result<Vec<MatchSummary>> {
    let body = get_fresh(client, &config.matches_url()).await?;
    normalize::parse_match_list(&body)
}
