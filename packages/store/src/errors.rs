//! Error types for the store.

use pagestack_common::RecordId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(RecordId),
}
