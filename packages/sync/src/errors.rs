use pagestack_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
