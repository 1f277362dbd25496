// WAF Monitor - Models
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Data models for the dashboard state.

mod event;
mod intent;
mod operation;
mod snapshot;

pub use event::{decode_events, AccessEvent, HealthRecord, SecurityEvent, ServiceRecord};
pub use intent::{Field, UpdateIntent};
pub use operation::{Operation, OperationCategory};
pub use snapshot::{ServiceRegistry, Snapshot};
