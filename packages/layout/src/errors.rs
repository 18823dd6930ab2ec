//! Error types for the layout engine.
//!
//! None of these surface to the user: ordering exhaustion is recovered by
//! renumbering the sibling run, dangling edges are deleted on the next
//! reflow pass, and the rest are programming-error signals for callers.

use pagestack_common::{OrderKeyError, RecordId};
use pagestack_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Ordering(#[from] OrderKeyError),

    /// An edge references a record that is missing or not an edge.
    #[error("dangling edge: {0}")]
    DanglingEdge(RecordId),

    #[error("record is not resizable: {0}")]
    NotResizable(RecordId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
