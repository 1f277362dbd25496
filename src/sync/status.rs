// WAF Monitor - Sync Status
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Health of the synchronization loop, for staleness indicators.

use chrono::{DateTime, Duration, Utc};

/// Commit state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreState {
    #[default]
    Idle,
    Committing,
}

/// What the store knows about its own freshness.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncStatus {
    pub state: StoreState,
    /// Whether the cluster tunnel is up, as last reported by the backend.
    pub cluster_connected: bool,
    pub deployed_at: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Successful commits since start-up.
    pub commits: u64,
    /// Updates dropped because a pull or decode failed.
    pub skipped_updates: u64,
    /// Results dropped because a newer version was already applied.
    pub stale_discarded: u64,
}

impl SyncStatus {
    /// Whether the dashboard is showing data that may be out of date.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match (self.last_success, self.last_failure) {
            (None, _) => true,
            (Some(success), Some(failure)) if failure > success => true,
            (Some(success), _) => now - success > max_age,
        }
    }
}
