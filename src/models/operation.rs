// WAF Monitor - Backend Status Codes
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Status sentinels returned in the `status` field of every backend response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    Registration,
    Health,
    EventFetching,
    Distribution,
}

/// A backend status sentinel.
///
/// Success and failure codes of one category are 100 apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Operation {
    RegistrationSuccessful,
    RegistrationFailure,
    HealthSuccessful,
    HealthFailure,
    EventFetchingSuccessful,
    EventFetchingFailure,
    DistributionSuccessful,
    DistributionFailure,
}

impl Operation {
    /// Numeric wire value.
    pub fn code(self) -> u16 {
        match self {
            Operation::RegistrationSuccessful => 101,
            Operation::RegistrationFailure => 201,
            Operation::HealthSuccessful => 301,
            Operation::HealthFailure => 401,
            Operation::EventFetchingSuccessful => 501,
            Operation::EventFetchingFailure => 601,
            Operation::DistributionSuccessful => 701,
            Operation::DistributionFailure => 801,
        }
    }

    pub fn category(self) -> OperationCategory {
        match self {
            Operation::RegistrationSuccessful | Operation::RegistrationFailure => {
                OperationCategory::Registration
            }
            Operation::HealthSuccessful | Operation::HealthFailure => OperationCategory::Health,
            Operation::EventFetchingSuccessful | Operation::EventFetchingFailure => {
                OperationCategory::EventFetching
            }
            Operation::DistributionSuccessful | Operation::DistributionFailure => {
                OperationCategory::Distribution
            }
        }
    }

    /// Whether the backend failed to produce data.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Operation::RegistrationFailure
                | Operation::HealthFailure
                | Operation::EventFetchingFailure
                | Operation::DistributionFailure
        )
    }
}

impl TryFrom<u16> for Operation {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            101 => Ok(Operation::RegistrationSuccessful),
            201 => Ok(Operation::RegistrationFailure),
            301 => Ok(Operation::HealthSuccessful),
            401 => Ok(Operation::HealthFailure),
            501 => Ok(Operation::EventFetchingSuccessful),
            601 => Ok(Operation::EventFetchingFailure),
            701 => Ok(Operation::DistributionSuccessful),
            801 => Ok(Operation::DistributionFailure),
            other => Err(format!("unknown status code {}", other)),
        }
    }
}

impl From<Operation> for u16 {
    fn from(op: Operation) -> Self {
        op.code()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}
