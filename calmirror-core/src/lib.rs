//! Core types and algorithm for the calmirror ecosystem.
//!
//! This crate holds everything a store implementation or frontend needs:
//! - `instance` / `parse` / `group` for the flat event-instance model
//! - `store` for the [`CalendarStore`] collaborator contract
//! - `sync` for the one-directional reconciliation pass

pub mod error;
pub mod group;
pub mod instance;
pub mod parse;
pub mod store;
pub mod sync;
pub mod window;

pub use error::{SyncError, SyncResult};
pub use instance::{EventInstance, InstanceTime, RawRecord};
pub use store::CalendarStore;
pub use sync::{InstanceSync, SyncStats};
pub use window::SyncWindow;
