// WAF Monitor - Update Intents
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Typed instructions for refreshing part of the snapshot.

use super::event::{AccessEvent, HealthRecord, SecurityEvent};
use super::snapshot::{ServiceRegistry, Snapshot};
use crate::stats::AttackDistribution;

/// Snapshot field an intent replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AccessEvents,
    SecurityEvents,
    AttackDistribution,
    Health,
    Services,
}

/// Fresh data for one snapshot field.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateIntent {
    AccessEventsReady(Vec<AccessEvent>),
    SecurityEventsReady(Vec<SecurityEvent>),
    AttackDistributionReady(AttackDistribution),
    HealthReady(Vec<HealthRecord>),
    ServicesReady(ServiceRegistry),
}

impl UpdateIntent {
    pub fn field(&self) -> Field {
        match self {
            UpdateIntent::AccessEventsReady(_) => Field::AccessEvents,
            UpdateIntent::SecurityEventsReady(_) => Field::SecurityEvents,
            UpdateIntent::AttackDistributionReady(_) => Field::AttackDistribution,
            UpdateIntent::HealthReady(_) => Field::Health,
            UpdateIntent::ServicesReady(_) => Field::Services,
        }
    }

    /// Merge into the snapshot. Every field is replaced wholesale.
    pub fn apply_to(self, snapshot: &mut Snapshot) {
        match self {
            UpdateIntent::AccessEventsReady(events) => snapshot.replace_access_events(events),
            UpdateIntent::SecurityEventsReady(events) => snapshot.replace_security_events(events),
            UpdateIntent::AttackDistributionReady(scores) => {
                snapshot.replace_attack_distribution(scores)
            }
            UpdateIntent::HealthReady(records) => snapshot.replace_health(records),
            UpdateIntent::ServicesReady(services) => snapshot.replace_services(services),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_intent_is_idempotent() {
        let events = vec![AccessEvent::default(), AccessEvent::default()];

        let mut once = Snapshot::default();
        UpdateIntent::AccessEventsReady(events.clone()).apply_to(&mut once);

        let mut twice = once.clone();
        UpdateIntent::AccessEventsReady(events).apply_to(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(twice.allowed_count(), 2);
    }

    #[test]
    fn test_intent_fields() {
        assert_eq!(
            UpdateIntent::HealthReady(Vec::new()).field(),
            Field::Health
        );
        assert_eq!(
            UpdateIntent::ServicesReady(ServiceRegistry::new()).field(),
            Field::Services
        );
    }
}
