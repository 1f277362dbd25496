// WAF Monitor - Notification Channel Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Push notifications from the cluster.

mod adapter;
mod transport;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

pub use adapter::NotificationChannel;
pub use transport::{PushTransport, WsTransport};

use crate::error::SyncError;
use crate::models::{decode_events, HealthRecord, SecurityEvent, ServiceRegistry};
use crate::stats::AttackDistribution;

/// Push topics published by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    TunnelConnection,
    TunnelDisconnection,
    AccessLogUpdate,
    SecurityLogUpdate,
    WafHealthUpdate,
    WafServicesUpdate,
    AttackDistributionUpdate,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::TunnelConnection,
        Topic::TunnelDisconnection,
        Topic::AccessLogUpdate,
        Topic::SecurityLogUpdate,
        Topic::WafHealthUpdate,
        Topic::WafServicesUpdate,
        Topic::AttackDistributionUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::TunnelConnection => "tunnel_connection",
            Topic::TunnelDisconnection => "tunnel_disconnection",
            Topic::AccessLogUpdate => "access_log_update",
            Topic::SecurityLogUpdate => "security_log_update",
            Topic::WafHealthUpdate => "waf_health_update",
            Topic::WafServicesUpdate => "waf_services_update",
            Topic::AttackDistributionUpdate => "attack_distribution_update",
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| format!("unknown topic `{}`", s))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded push message. `None` payloads ask the store to pull.
///
/// Access log pushes carry no payload: the store always pulls the
/// authoritative list for them.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    TunnelConnected { deployed_at: Option<DateTime<Utc>> },
    TunnelDisconnected,
    AccessLogUpdated,
    SecurityLogUpdated(Option<Vec<SecurityEvent>>),
    HealthUpdated(Option<Vec<HealthRecord>>),
    ServicesUpdated(Option<ServiceRegistry>),
    AttackDistributionUpdated(Option<AttackDistribution>),
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::TunnelConnected { .. } => Topic::TunnelConnection,
            Notification::TunnelDisconnected => Topic::TunnelDisconnection,
            Notification::AccessLogUpdated => Topic::AccessLogUpdate,
            Notification::SecurityLogUpdated(_) => Topic::SecurityLogUpdate,
            Notification::HealthUpdated(_) => Topic::WafHealthUpdate,
            Notification::ServicesUpdated(_) => Topic::WafServicesUpdate,
            Notification::AttackDistributionUpdated(_) => Topic::AttackDistributionUpdate,
        }
    }

    /// Decode the payload of a message on `topic`.
    ///
    /// `null` and empty strings count as "no payload". So do empty objects,
    /// except on `waf_services_update` where `{}` is an empty registry.
    pub fn decode(topic: Topic, data: Value) -> Result<Self, SyncError> {
        let data = match data {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Object(map) if map.is_empty() && topic != Topic::WafServicesUpdate => None,
            other => Some(other),
        };
        let err = |e: serde_json::Error| SyncError::decode(topic.as_str(), e);

        let notification = match topic {
            Topic::TunnelConnection => Notification::TunnelConnected {
                deployed_at: data.as_ref().and_then(Value::as_f64).and_then(unix_time),
            },
            Topic::TunnelDisconnection => Notification::TunnelDisconnected,
            Topic::AccessLogUpdate => Notification::AccessLogUpdated,
            Topic::SecurityLogUpdate => {
                #[derive(Deserialize)]
                struct SecurityLog {
                    events: Value,
                }

                let events = match data {
                    Some(value) => {
                        let log: SecurityLog = serde_json::from_value(value).map_err(err)?;
                        Some(decode_events(log.events).map_err(err)?)
                    }
                    None => None,
                };
                Notification::SecurityLogUpdated(events)
            }
            Topic::WafHealthUpdate => Notification::HealthUpdated(match data {
                Some(Value::Array(samples)) => {
                    Some(samples.into_iter().map(HealthRecord).collect())
                }
                // A single sample, as pushed by the WAF engine every cycle.
                Some(sample @ (Value::Number(_) | Value::Object(_))) => {
                    Some(vec![HealthRecord(sample)])
                }
                Some(other) => {
                    return Err(SyncError::decode(
                        topic.as_str(),
                        format!("expected a health sample or list, got {}", other),
                    ))
                }
                None => None,
            }),
            Topic::WafServicesUpdate => Notification::ServicesUpdated(
                data.map(serde_json::from_value).transpose().map_err(err)?,
            ),
            Topic::AttackDistributionUpdate => {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Scores {
                    Wrapped { scores: AttackDistribution },
                    Bare(AttackDistribution),
                }

                let scores = data
                    .map(serde_json::from_value::<Scores>)
                    .transpose()
                    .map_err(err)?
                    .map(|s| match s {
                        Scores::Wrapped { scores } => scores,
                        Scores::Bare(scores) => scores,
                    });
                Notification::AttackDistributionUpdated(scores)
            }
        };
        Ok(notification)
    }
}

fn unix_time(secs: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
}
