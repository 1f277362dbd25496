// WAF Monitor - Statistics Aggregator
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Pure functions deriving dashboard metrics from raw event lists.

use std::collections::HashMap;

use super::models::TopNRanking;
use crate::models::SecurityEvent;

/// Length of the attack source ranking.
pub const TOP_SOURCES: usize = 5;

/// Rank origin addresses by how many security events they produced.
///
/// Equal counts are ordered by address, ascending, so the result does not
/// depend on hash iteration order.
pub fn compute_top_attack_sources(events: &[SecurityEvent]) -> TopNRanking {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for event in events {
        *counts.entry(event.ip.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_SOURCES);

    TopNRanking::new(
        ranked
            .into_iter()
            .map(|(ip, count)| (ip.to_string(), count))
            .collect(),
    )
}

/// Total transactions seen by the cluster.
///
/// Counts are u64; the sum saturates at `u64::MAX` instead of wrapping.
pub fn compute_totals(allowed: u64, blocked: u64) -> u64 {
    allowed.saturating_add(blocked)
}
