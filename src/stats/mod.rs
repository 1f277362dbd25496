// WAF Monitor - Statistics Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Security metric aggregation.

mod aggregator;
pub mod models;

pub use aggregator::{compute_top_attack_sources, compute_totals, TOP_SOURCES};
pub use models::{AttackDistribution, TopNRanking};
