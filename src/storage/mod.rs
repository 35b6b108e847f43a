pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{LogStorage, NodeFile, StorageError};
