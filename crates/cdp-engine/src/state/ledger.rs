//! Collateral and debt ledgers
//!
//! Per-account bookkeeping with implicit entries: a lookup on a key never
//! written returns zero, and entries that return to zero are dropped again.

use std::collections::BTreeMap;

use crate::error::{CdpError, EngineResult};
use crate::state::{AccountId, AssetId};

/// Deposited collateral and minted debt, owned exclusively by the engine
#[derive(Debug, Default)]
pub struct LedgerState {
    collateral: BTreeMap<AccountId, BTreeMap<AssetId, u128>>,
    debt: BTreeMap<AccountId, u128>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposited amount of one asset, zero for never-written keys
    pub fn collateral_balance(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.collateral
            .get(account)
            .and_then(|per_asset| per_asset.get(asset))
            .copied()
            .unwrap_or(0)
    }

    /// Outstanding minted debt, zero for never-written keys
    pub fn debt_of(&self, account: &AccountId) -> u128 {
        self.debt.get(account).copied().unwrap_or(0)
    }

    pub fn credit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        let updated = self
            .collateral_balance(account, asset)
            .checked_add(amount)
            .ok_or(CdpError::ArithmeticOverflow)?;
        self.set_collateral(account, asset, updated);
        Ok(())
    }

    pub fn debit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        let updated = self
            .collateral_balance(account, asset)
            .checked_sub(amount)
            .ok_or(CdpError::InsufficientCollateral)?;
        self.set_collateral(account, asset, updated);
        Ok(())
    }

    /// Overwrites a collateral entry; rollback restores go through here
    pub fn set_collateral(&mut self, account: &AccountId, asset: &AssetId, amount: u128) {
        if amount == 0 {
            if let Some(per_asset) = self.collateral.get_mut(account) {
                per_asset.remove(asset);
                if per_asset.is_empty() {
                    self.collateral.remove(account);
                }
            }
        } else {
            self.collateral
                .entry(*account)
                .or_default()
                .insert(*asset, amount);
        }
    }

    pub fn credit_debt(&mut self, account: &AccountId, amount: u128) -> EngineResult<()> {
        let updated = self
            .debt_of(account)
            .checked_add(amount)
            .ok_or(CdpError::ArithmeticOverflow)?;
        self.set_debt(account, updated);
        Ok(())
    }

    pub fn debit_debt(&mut self, account: &AccountId, amount: u128) -> EngineResult<()> {
        let updated = self
            .debt_of(account)
            .checked_sub(amount)
            .ok_or(CdpError::InsufficientDebt)?;
        self.set_debt(account, updated);
        Ok(())
    }

    /// Overwrites a debt entry; rollback restores go through here
    pub fn set_debt(&mut self, account: &AccountId, amount: u128) {
        if amount == 0 {
            self.debt.remove(account);
        } else {
            self.debt.insert(*account, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    fn asset(n: u8) -> AssetId {
        AssetId::new([n; 32])
    }

    #[test]
    fn test_never_written_keys_read_zero() {
        let ledger = LedgerState::new();
        assert_eq!(ledger.collateral_balance(&account(1), &asset(1)), 0);
        assert_eq!(ledger.debt_of(&account(1)), 0);
    }

    #[test]
    fn test_collateral_credit_and_debit() {
        let mut ledger = LedgerState::new();
        ledger.credit_collateral(&account(1), &asset(1), 100).unwrap();
        ledger.credit_collateral(&account(1), &asset(1), 50).unwrap();
        assert_eq!(ledger.collateral_balance(&account(1), &asset(1)), 150);

        ledger.debit_collateral(&account(1), &asset(1), 150).unwrap();
        assert_eq!(ledger.collateral_balance(&account(1), &asset(1)), 0);
    }

    #[test]
    fn test_overdraw_collateral_rejected() {
        let mut ledger = LedgerState::new();
        ledger.credit_collateral(&account(1), &asset(1), 10).unwrap();
        assert_eq!(
            ledger.debit_collateral(&account(1), &asset(1), 11),
            Err(CdpError::InsufficientCollateral)
        );
        // Failed debit leaves the balance untouched.
        assert_eq!(ledger.collateral_balance(&account(1), &asset(1)), 10);
    }

    #[test]
    fn test_collateral_credit_overflow_rejected() {
        let mut ledger = LedgerState::new();
        ledger
            .credit_collateral(&account(1), &asset(1), u128::MAX)
            .unwrap();
        assert_eq!(
            ledger.credit_collateral(&account(1), &asset(1), 1),
            Err(CdpError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_debt_credit_and_debit() {
        let mut ledger = LedgerState::new();
        ledger.credit_debt(&account(2), 1_000).unwrap();
        assert_eq!(ledger.debt_of(&account(2)), 1_000);

        assert_eq!(
            ledger.debit_debt(&account(2), 1_001),
            Err(CdpError::InsufficientDebt)
        );
        ledger.debit_debt(&account(2), 1_000).unwrap();
        assert_eq!(ledger.debt_of(&account(2)), 0);
    }

    #[test]
    fn test_balances_are_isolated_per_asset() {
        let mut ledger = LedgerState::new();
        ledger.credit_collateral(&account(1), &asset(1), 7).unwrap();
        assert_eq!(ledger.collateral_balance(&account(1), &asset(2)), 0);
        assert_eq!(ledger.collateral_balance(&account(2), &asset(1)), 0);
    }
}
