pub use normalize::{parse_update, update_from_value};
pub use reconciler::merge;
pub use snapshot::SnapshotFetcher;
pub use stream::{
    ControlMessage, ControlVerb, StreamConnector, UpdateChannel, WsChannel, WsConnector,
};

pub mod normalize;
pub(crate) mod publisher;
pub mod reconciler;
pub mod snapshot;
pub mod stream;
pub(crate) mod supervisor;

#[cfg(test)]
pub(crate) mod testing;
