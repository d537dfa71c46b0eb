// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore identities and the permits issued against them

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Key naming one logical resource, e.g. `host:10.0.0.1:script-100`.
///
/// Shared by every participant and never mutated; all permits live in its
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SemaphoreId(String);

impl SemaphoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SemaphoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SemaphoreId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SemaphoreId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque id the store assigns to a granted permit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermitId(String);

impl PermitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PermitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time-bounded grant of one slot.
///
/// Valid from issuance until release or expiry, whichever comes first.
/// `issued_at + lease_ttl` is the expiry as granted; renewals push the
/// store-side expiry forward without touching this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit {
    pub id: PermitId,
    pub semaphore: SemaphoreId,
    pub issued_at: Instant,
    pub lease_ttl: Duration,
}

impl Permit {
    pub fn new(id: PermitId, semaphore: SemaphoreId, issued_at: Instant, lease_ttl: Duration) -> Self {
        Self {
            id,
            semaphore,
            issued_at,
            lease_ttl,
        }
    }

    /// Expiry of the initial lease
    pub fn initial_expiry(&self) -> Instant {
        crate::clock::saturating_add(self.issued_at, self.lease_ttl)
    }
}

impl std::fmt::Display for Permit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.semaphore, self.id)
    }
}
