// WAF Monitor - Snapshot Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! The canonical dashboard state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::{AccessEvent, HealthRecord, SecurityEvent, ServiceRecord};
use crate::stats::{self, AttackDistribution, TopNRanking};

/// Service id to its status record.
pub type ServiceRegistry = BTreeMap<String, ServiceRecord>;

/// Everything the dashboard shows.
///
/// Counters and the source ranking are derived from the event lists and are
/// only ever written through the `replace_*` methods, so
/// `total_count == allowed_count + blocked_count` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    /// Time of the last successful commit.
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    allowed_count: u64,
    #[serde(default)]
    blocked_count: u64,
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    access_events: Vec<AccessEvent>,
    #[serde(default)]
    security_events: Vec<SecurityEvent>,
    #[serde(default)]
    attack_distribution: AttackDistribution,
    #[serde(default)]
    attack_sources: TopNRanking,
    #[serde(default)]
    health: Vec<HealthRecord>,
    #[serde(default)]
    services: ServiceRegistry,
}

impl Snapshot {
    pub fn allowed_count(&self) -> u64 {
        self.allowed_count
    }

    pub fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn access_events(&self) -> &[AccessEvent] {
        &self.access_events
    }

    pub fn security_events(&self) -> &[SecurityEvent] {
        &self.security_events
    }

    pub fn attack_distribution(&self) -> &AttackDistribution {
        &self.attack_distribution
    }

    pub fn attack_sources(&self) -> &TopNRanking {
        &self.attack_sources
    }

    pub fn health(&self) -> &[HealthRecord] {
        &self.health
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Replace the allowed events wholesale.
    pub fn replace_access_events(&mut self, events: Vec<AccessEvent>) {
        self.allowed_count = events.len() as u64;
        self.access_events = events;
        self.total_count = stats::compute_totals(self.allowed_count, self.blocked_count);
    }

    /// Replace the blocked events wholesale and re-rank their sources.
    pub fn replace_security_events(&mut self, events: Vec<SecurityEvent>) {
        self.blocked_count = events.len() as u64;
        self.attack_sources = stats::compute_top_attack_sources(&events);
        self.security_events = events;
        self.total_count = stats::compute_totals(self.allowed_count, self.blocked_count);
    }

    pub fn replace_attack_distribution(&mut self, scores: AttackDistribution) {
        self.attack_distribution = scores;
    }

    pub fn replace_health(&mut self, records: Vec<HealthRecord>) {
        self.health = records;
    }

    pub fn replace_services(&mut self, services: ServiceRegistry) {
        self.services = services;
    }

    /// Recompute every derived field from the event lists.
    ///
    /// Applied to anything read back from storage, since a stored record is
    /// not trusted to satisfy the counter invariants.
    pub fn normalize(&mut self) {
        self.allowed_count = self.access_events.len() as u64;
        self.blocked_count = self.security_events.len() as u64;
        self.total_count = stats::compute_totals(self.allowed_count, self.blocked_count);
        self.attack_sources = stats::compute_top_attack_sources(&self.security_events);
    }

    /// Human-readable commit time, e.g. `18 Oct 2026, 14:03`.
    pub fn last_update_display(&self) -> String {
        self.last_update
            .map(|t| t.format("%d %b %Y, %H:%M").to_string())
            .unwrap_or_default()
    }
}
