//! # Pagestack Layout
//!
//! The layout engine over the record store: an ordered containment graph
//! of typed edge records, a vertical-stacking reflow pass, and the drag
//! and resize gesture state machines that drive both.
//!
//! Design principles:
//!
//! - **Edges are records.** Containment lives in ordinary `edge` records
//!   with fractional ordering keys, so bindings replicate, tombstone, and
//!   migrate exactly like shapes do.
//! - **Reflow is idempotent.** Running the pass over consistent state
//!   writes nothing, which lets local gestures and remote merges both
//!   schedule it without churn.
//! - **Gestures freeze their records.** A record under an active drag or
//!   resize keeps its position (while still reserving its extent) until
//!   the gesture settles or reverts from its snapshot.

pub mod capability;
pub mod drag;
pub mod errors;
pub mod graph;
pub mod reflow;
pub mod resize;

pub use drag::{DragSession, DragState};
pub use errors::LayoutError;
pub use graph::{edge_between, edges_of, edges_to, EdgePatch};
pub use reflow::{reflow, LayoutEngine};
pub use resize::{ResizeSession, ResizeState};
