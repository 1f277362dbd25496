// WAF Monitor - Synchronization Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Reconciles push notifications and pulls into one snapshot.

mod handle;
mod status;
mod store;

pub use handle::StoreHandle;
pub use status::{StoreState, SyncStatus};
pub use store::SyncStore;
