//! Shared primitives for the pagestack workspace: record ids, 2-D
//! geometry, and the fractional ordering-key allocator.

pub mod geom;
pub mod id;
pub mod order_key;

pub use geom::{Rect, Vec2};
pub use id::RecordId;
pub use order_key::{key_between, OrderKey, OrderKeyError};
