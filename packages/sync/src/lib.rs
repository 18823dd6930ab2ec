//! # Pagestack Sync
//!
//! Multiplayer plumbing for the document store: a migration pass for
//! legacy wire shapes, a reconciler that coalesces and throttles
//! outbound changes and merges inbound ones under last-write-wins, and
//! the session wrapper hosts drive.
//!
//! Design principles:
//!
//! - **The transport is someone else's problem.** Outbound patches go
//!   through the [`Transport`] trait; inbound state is pushed in by the
//!   host. No wire, no retries, no async runtime.
//! - **Merges never echo.** Inbound records keep their stamps and skip
//!   the change log, and records stamped by the local writer are
//!   discarded on arrival.
//! - **Versions decide.** Per-record `(source, version)` stamps gate
//!   every inbound write, tombstones included.

pub mod config;
pub mod errors;
pub mod migrate;
pub mod reconciler;
pub mod session;
pub mod throttle;
pub mod transport;

pub use config::SyncConfig;
pub use errors::SyncError;
pub use migrate::migrate;
pub use reconciler::Reconciler;
pub use session::Session;
pub use throttle::Throttle;
pub use transport::{ChannelTransport, Patch, Transport};
