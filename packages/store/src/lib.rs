//! # Pagestack Store
//!
//! The Document State Store: the single mutable in-memory document that
//! the layout engine and drag machinery mutate and the sync reconciler
//! observes.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ layout: graph edits + reflow + gestures     │
//! └─────────────────────────────────────────────┘
//!                     ↓ batched writes
//! ┌─────────────────────────────────────────────┐
//! │ store: record table + local change log      │
//! │  - (source, version) stamping per write     │
//! │  - one ChangeSet per top-level batch        │
//! │  - merge_remote for inbound application     │
//! └─────────────────────────────────────────────┘
//!                     ↓ drain_changes
//! ┌─────────────────────────────────────────────┐
//! │ sync: reconciler → transport                │
//! └─────────────────────────────────────────────┘
//! ```

mod changes;
mod errors;
mod meta;
mod record;
mod store;

pub use changes::ChangeSet;
pub use errors::StoreError;
pub use meta::Meta;
pub use record::{
    EdgeKind, EdgeProps, ItemProps, PageProps, Props, Record, RecordType, SectionProps,
    StackProps, TextStyle,
};
pub use store::Store;
