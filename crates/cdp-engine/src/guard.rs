//! Operation lock
//!
//! One process-wide "operation in progress" flag. Every mutating entry
//! point acquires it before touching any ledger; a nested acquisition from
//! within an external call fails with `ReentrancyDetected`. Read-only
//! queries never take the lock.

use std::cell::Cell;

use crate::error::{CdpError, EngineResult};

/// Process-wide reentrancy flag
#[derive(Debug, Default)]
pub struct OperationLock {
    entered: Cell<bool>,
    operation_count: Cell<u64>,
}

impl OperationLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one operation.
    ///
    /// The returned guard releases it on every exit path, panics included.
    pub fn enter(&self) -> EngineResult<OperationGuard<'_>> {
        if self.entered.replace(true) {
            return Err(CdpError::ReentrancyDetected);
        }
        self.operation_count
            .set(self.operation_count.get().wrapping_add(1));
        Ok(OperationGuard { lock: self })
    }

    /// Whether an operation is currently in flight
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }

    /// Operations started since construction
    pub fn operation_count(&self) -> u64 {
        self.operation_count.get()
    }
}

/// Scope handle for one acquired operation
#[derive(Debug)]
pub struct OperationGuard<'a> {
    lock: &'a OperationLock,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.lock.entered.set(false);
    }
}
