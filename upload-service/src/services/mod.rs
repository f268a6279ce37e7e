pub mod metrics;
pub mod persister;
pub mod storage;

pub use metrics::{get_metrics, init_metrics};
pub use persister::FilePersister;
pub use storage::{LocalStorage, Storage, StorageError};
