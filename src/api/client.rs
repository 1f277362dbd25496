// WAF Monitor - HTTP API Client
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Backend REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Backend, Payload, Resource};
use crate::error::SyncError;
use crate::models::{decode_events, HealthRecord, Operation};
use crate::stats::AttackDistribution;

/// Fields shared by every response body.
///
/// Only the field the resource needs is decoded; the rest are ignored.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<Operation>,
    #[serde(default)]
    events: Option<Value>,
    #[serde(default)]
    scores: Option<AttackDistribution>,
    #[serde(default)]
    health: Option<Vec<HealthRecord>>,
}

/// Client for the dashboard backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5001/api`).
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("waf-monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch(&self, resource: Resource) -> Result<Payload, SyncError> {
        let url = self.url(resource);
        debug!("Pulling {}", url);

        let network = |reason: String| SyncError::Network { resource, reason };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(network(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(|e| network(e.to_string()))?;
        decode_response(resource, &body)
    }
}

/// Turn a response body into a payload, honoring the status sentinel.
pub(crate) fn decode_response(resource: Resource, body: &str) -> Result<Payload, SyncError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| SyncError::decode(resource.path(), e))?;

    if let Some(status) = envelope.status {
        if status.is_failure() {
            return Err(SyncError::SoftApiFailure { resource, status });
        }
    }

    let missing = |field: &str| SyncError::decode(resource.path(), format!("missing `{}`", field));

    match resource {
        Resource::AuthorizedEvents => {
            let events = envelope.events.ok_or_else(|| missing("events"))?;
            decode_events(events)
                .map(Payload::AuthorizedEvents)
                .map_err(|e| SyncError::decode(resource.path(), e))
        }
        Resource::SecurityEvents => {
            let events = envelope.events.ok_or_else(|| missing("events"))?;
            decode_events(events)
                .map(Payload::SecurityEvents)
                .map_err(|e| SyncError::decode(resource.path(), e))
        }
        Resource::AttackDistribution => envelope
            .scores
            .map(Payload::AttackDistribution)
            .ok_or_else(|| missing("scores")),
        Resource::Health => envelope
            .health
            .map(Payload::Health)
            .ok_or_else(|| missing("health")),
    }
}
