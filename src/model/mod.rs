mod event;
mod match_view;
mod matchlist;
mod subscription;
mod update;

pub use event::*;
pub use match_view::*;
pub use matchlist::*;
pub use subscription::*;
pub use update::*;
