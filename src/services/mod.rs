pub mod dispatch;
pub mod photo_storage;
pub mod snapshot;

pub use dispatch::DispatchService;
pub use photo_storage::PhotoStorage;
pub use snapshot::SnapshotService;
