//! Gardensync Notion adapter
//!
//! Implements the core's network-facing ports over the HTTP backend that
//! fronts the Notion workspace:
//!
//! - [`client`] - `NotionSyncClient`, the delta-sync and block-read HTTP
//!   calls with timeout and error mapping
//! - [`blocks`] - typed remote block schema, validated on ingest so the
//!   rest of the core only ever sees the `Task` shape

pub mod blocks;
pub mod client;

pub use client::NotionSyncClient;
