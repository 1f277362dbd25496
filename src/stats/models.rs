// WAF Monitor - Statistics Models
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Derived security metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attack category to score, computed upstream.
pub type AttackDistribution = BTreeMap<String, f64>;

/// Most frequent attack origins as `(address, occurrences)`, descending by count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TopNRanking(Vec<(String, u64)>);

impl TopNRanking {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Addresses in rank order, for chart labels.
    pub fn sources(&self) -> Vec<&str> {
        self.0.iter().map(|(ip, _)| ip.as_str()).collect()
    }

    /// Counts in rank order, for chart values.
    pub fn counts(&self) -> Vec<u64> {
        self.0.iter().map(|(_, count)| *count).collect()
    }
}
