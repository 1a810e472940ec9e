//! Gardensync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Task`, the pending-delta collections, `TaskStore`
//! - **Reconciliation** - folding a sync response back into local state
//! - **Wire contract** - `SyncDeltaRequest` / `SyncDeltaResponse` DTOs
//! - **Port definitions** - Traits for adapters: `RemoteSyncPort`,
//!   `TaskReaderPort`, `SyncObserverPort`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure, synchronous business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement. The async
//! scheduler and engine live in `gardensync-sync`; the HTTP adapter lives
//! in `gardensync-notion`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod wire;
