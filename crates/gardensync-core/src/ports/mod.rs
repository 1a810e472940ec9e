//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`RemoteSyncPort`] - The batch delta-sync boundary call
//! - [`TaskReaderPort`] - Session-load snapshot of the remote task list
//! - [`SyncObserverPort`] - Non-fatal sync status reporting

pub mod observer;
pub mod remote_sync;
pub mod task_reader;

pub use observer::SyncObserverPort;
pub use remote_sync::{RemoteSyncError, RemoteSyncPort};
pub use task_reader::TaskReaderPort;
