// WAF Monitor - Errors
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Error types shared by the synchronization engine.

use thiserror::Error;

use crate::api::Resource;
use crate::models::Operation;

/// Failures the engine handles locally.
///
/// None of these ever reach a consumer of the snapshot: the update that
/// produced one is logged and skipped, and the affected fields keep their
/// last good values.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error while fetching {resource}: {reason}")]
    Network { resource: Resource, reason: String },

    #[error("Backend reported {status} for {resource}")]
    SoftApiFailure { resource: Resource, status: Operation },

    #[error("Failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Update queue unavailable: {0}")]
    Queue(&'static str),
}

impl SyncError {
    /// Build a decode error from anything displayable.
    pub fn decode(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SyncError::Decode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Persistence(e.to_string())
    }
}
