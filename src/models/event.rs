// WAF Monitor - Event Models
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Filtered-request events and opaque cluster status records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request the cluster let through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AccessEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Everything else the cluster sent, kept verbatim.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A request the cluster blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SecurityEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    /// Origin address, used for source ranking.
    pub ip: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl SecurityEvent {
    /// Create a bare event from an origin address.
    pub fn from_ip(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            ..Default::default()
        }
    }
}

/// One health sample, passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthRecord(pub Value);

/// One service status blob, passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRecord(pub Value);

/// Decode a list of events.
///
/// The cluster forwards each event already serialized, so an element may be
/// either a JSON object or a string holding one.
pub fn decode_events<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_value(value)?;
    items
        .into_iter()
        .map(|item| match item {
            Value::String(encoded) => serde_json::from_str(&encoded),
            other => serde_json::from_value(other),
        })
        .collect()
}
