//! Per-operation undo journal
//!
//! Mutating operations run against the live ledgers. Every ledger write is
//! recorded here first with its prior value, and every completed external
//! call with the action that undoes it. Aborting replays the prior values
//! in reverse and then fires the compensating actions in reverse; events
//! are staged here and only reach the log when the operation commits.

use tracing::error;

use crate::custody::{AssetCustodian, DebtIssuer};
use crate::events::{Event, EventType};
use crate::state::{AccountId, AssetId, LedgerState};

/// Prior ledger value captured before a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEntry {
    Collateral {
        account: AccountId,
        asset: AssetId,
        previous: u128,
    },
    Debt {
        account: AccountId,
        previous: u128,
    },
}

/// External action reversing an already-performed external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Undoes a transfer-in: pay custody collateral back out
    ReturnCollateral {
        to: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Undoes a transfer-out: pull paid-out collateral back
    ReclaimCollateral {
        from: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Undoes a completed pull-and-destroy: issue replacement debt tokens
    ReissueDebt { to: AccountId, amount: u128 },
    /// Undoes a pull whose destruction never happened: hand the tokens back
    ReleaseDebt { to: AccountId, amount: u128 },
}

/// Rollback state for one in-flight operation
#[derive(Debug, Default)]
pub struct Journal {
    undo: Vec<UndoEntry>,
    compensations: Vec<Compensation>,
    staged_events: Vec<(EventType, Vec<u8>)>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the prior value of a collateral entry about to change
    pub fn note_collateral(&mut self, account: AccountId, asset: AssetId, previous: u128) {
        self.undo.push(UndoEntry::Collateral {
            account,
            asset,
            previous,
        });
    }

    /// Records the prior value of a debt entry about to change
    pub fn note_debt(&mut self, account: AccountId, previous: u128) {
        self.undo.push(UndoEntry::Debt { account, previous });
    }

    /// Registers the undo action for a completed external call
    pub fn note_compensation(&mut self, compensation: Compensation) {
        self.compensations.push(compensation);
    }

    /// Swaps the most recent compensation when a later external step
    /// subsumes it (a destroyed pull is undone by reissuing, not releasing).
    pub fn replace_last_compensation(&mut self, compensation: Compensation) {
        self.compensations.pop();
        self.compensations.push(compensation);
    }

    /// Stages an event for commit
    pub fn stage<E: Event>(&mut self, event: &E) {
        self.staged_events.push((E::event_type(), event.payload()));
    }

    /// Finishes the operation, yielding the staged events in order
    pub fn commit(self) -> Vec<(EventType, Vec<u8>)> {
        self.staged_events
    }

    /// Restores every recorded ledger value, newest first
    pub fn unwind_ledgers(&self, ledger: &mut LedgerState) {
        for entry in self.undo.iter().rev() {
            match entry {
                UndoEntry::Collateral {
                    account,
                    asset,
                    previous,
                } => ledger.set_collateral(account, asset, *previous),
                UndoEntry::Debt { account, previous } => ledger.set_debt(account, *previous),
            }
        }
    }

    /// Fires the compensating actions, newest first, best effort.
    ///
    /// A failed compensation leaves custody out of step with the restored
    /// ledgers; the discrepancy is logged for reconciliation and does not
    /// mask the original failure.
    pub fn unwind_externals(self, custodian: &dyn AssetCustodian, issuer: &dyn DebtIssuer) {
        for compensation in self.compensations.iter().rev() {
            let outcome = match compensation {
                Compensation::ReturnCollateral { to, asset, amount } => {
                    custodian.transfer_out(to, asset, *amount)
                }
                Compensation::ReclaimCollateral {
                    from,
                    asset,
                    amount,
                } => custodian.transfer_in(from, asset, *amount),
                Compensation::ReissueDebt { to, amount } => issuer.issue(to, *amount),
                Compensation::ReleaseDebt { to, amount } => issuer.release(to, *amount),
            };
            if let Err(err) = outcome {
                error!(
                    action = ?compensation,
                    error = %err,
                    "compensating action failed; custody needs reconciliation"
                );
            }
        }
    }
}
