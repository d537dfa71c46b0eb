// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permit id generation
//!
//! Permit ids are opaque to holders; only the store that issued one
//! interprets it.

use crate::permit::PermitId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues permit ids
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next_permit(&self) -> PermitId;
}

/// UUID v4 ids for production stores
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_permit(&self) -> PermitId {
        PermitId::new(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Predictable ids for tests: `<prefix>-1`, `<prefix>-2`, ...
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("permit")
    }
}

impl IdGen for SequentialIdGen {
    fn next_permit(&self) -> PermitId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        PermitId::new(format!("{}-{}", self.prefix, n))
    }
}
