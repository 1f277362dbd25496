// WAF Monitor - Library Root
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Client-side synchronization and aggregation engine for a WAF cluster
//! monitoring dashboard.
//!
//! ```text
//! push frame ─► NotificationChannel ─► StoreHandle::notify ─┐
//!                                                           ▼
//!                 ApiClient ◄── pull ── SyncStore (single writer)
//!                                         │  commit + aggregate
//!                                         ▼
//!                               SnapshotStore::save
//!                                         │
//!                                         ▼
//!                       StoreHandle::snapshot / watch (read-only)
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod models;
pub mod stats;
pub mod storage;
pub mod sync;

pub use error::SyncError;
pub use sync::{StoreHandle, SyncStore};
