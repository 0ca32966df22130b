//! Keep a live cricket match view in sync: stream updates over WebSocket,
//! fall back to HTTP polling, and merge both into one view model.

pub use client::CricketClient;
pub use config::{ControlKey, ReconnectPolicy, SyncConfig};
pub use error::{Result, SyncError};
pub use live::LiveMatch;
pub use model::*;
pub use sync::{merge, SnapshotFetcher, StreamConnector, UpdateChannel, WsConnector};

mod client;
pub mod config;
mod error;
mod live;
pub mod model;
pub mod sync;
