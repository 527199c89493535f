pub mod manager;
pub mod snapshot;

pub use manager::PreorderManager;
pub use snapshot::{LineRequest, PreorderRequest, PreorderSnapshotBuilder};
