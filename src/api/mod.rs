// WAF Monitor - API Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! On-demand pulls against the dashboard backend.

mod client;

use std::fmt;

use async_trait::async_trait;

pub use client::ApiClient;

use crate::error::SyncError;
use crate::models::{AccessEvent, HealthRecord, SecurityEvent, UpdateIntent};
use crate::stats::AttackDistribution;

/// A pullable backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    AuthorizedEvents,
    SecurityEvents,
    AttackDistribution,
    Health,
}

impl Resource {
    /// Every resource, in the order a full resync pulls them.
    pub const ALL: [Resource; 4] = [
        Resource::AuthorizedEvents,
        Resource::SecurityEvents,
        Resource::AttackDistribution,
        Resource::Health,
    ];

    /// Path segment under the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::AuthorizedEvents => "authorized_events",
            Resource::SecurityEvents => "security_events",
            Resource::AttackDistribution => "attack_distribution",
            Resource::Health => "health",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Decoded body of a successful pull.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    AuthorizedEvents(Vec<AccessEvent>),
    SecurityEvents(Vec<SecurityEvent>),
    AttackDistribution(AttackDistribution),
    Health(Vec<HealthRecord>),
}

impl From<Payload> for UpdateIntent {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::AuthorizedEvents(events) => UpdateIntent::AccessEventsReady(events),
            Payload::SecurityEvents(events) => UpdateIntent::SecurityEventsReady(events),
            Payload::AttackDistribution(scores) => UpdateIntent::AttackDistributionReady(scores),
            Payload::Health(records) => UpdateIntent::HealthReady(records),
        }
    }
}

/// Anything that can answer a pull.
///
/// Calls are independent and stateless. Transport problems come back as
/// `SyncError::Network`, failure sentinels as `SyncError::SoftApiFailure`.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch(&self, resource: Resource) -> Result<Payload, SyncError>;
}
