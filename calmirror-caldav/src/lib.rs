//! CalDAV store implementation for calmirror.
//!
//! Provides [`CalDavStore`], a [`calmirror_core::CalendarStore`] backed by a
//! plain CalDAV server (Nextcloud, Kerio, iCloud-style endpoints).

pub mod client;
pub mod store;

pub use client::CalDavClient;
pub use store::{CalDavEndpoint, CalDavStore};
