//! Debt engine
//!
//! Orchestrates the collateral and debt ledgers behind the health-factor
//! invariant: an indebted account's risk-adjusted collateral value, scaled
//! by the engine precision, must stay at or above the minimum health factor
//! relative to its debt. Mutating operations are serialized by the
//! operation lock and journaled: any failure rolls the whole operation
//! back, and events reach the log only on commit.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::custody::{AssetCustodian, DebtIssuer};
use crate::error::{CdpError, EngineResult};
use crate::events::{
    AccountLiquidated, CollateralDeposited, CollateralRedeemed, DebtBurned, DebtMinted, EventLog,
    EventRecord,
};
use crate::guard::OperationLock;
use crate::journal::{Compensation, Journal};
use crate::math;
use crate::oracle::{self, PriceReading, PriceSource};
use crate::state::{
    AccountId, AssetId, EngineConfig, EngineStats, LedgerState, PriceFeedId, SupportedAsset,
};

/// Health factor for one account snapshot: risk-adjusted collateral value
/// relative to debt, scaled by `config.precision`.
///
/// Zero debt is always safe and yields `u128::MAX`; a ratio too large to
/// represent saturates to the same value.
pub fn compute_health_factor(
    debt_minted: u128,
    collateral_value_usd: u128,
    config: &EngineConfig,
) -> EngineResult<u128> {
    if debt_minted == 0 {
        return Ok(u128::MAX);
    }
    let adjusted = math::percent_of(collateral_value_usd, config.liquidation_threshold)?;
    // Dust debt can push the quotient past u128::MAX; a ratio beyond the
    // representable range saturates like the zero-debt case.
    match math::mul_div(adjusted, config.precision, debt_minted) {
        Err(CdpError::ArithmeticOverflow) => Ok(u128::MAX),
        other => other,
    }
}

/// Collateralized-debt engine over externally custodied assets
pub struct CdpEngine {
    config: EngineConfig,
    assets: Vec<SupportedAsset>,
    ledger: RefCell<LedgerState>,
    events: RefCell<EventLog>,
    stats: RefCell<EngineStats>,
    lock: OperationLock,
    oracle: Rc<dyn PriceSource>,
    custodian: Rc<dyn AssetCustodian>,
    issuer: Rc<dyn DebtIssuer>,
}

impl CdpEngine {
    /// Builds an engine supporting `assets`, each priced by the feed at the
    /// same position of `feeds`.
    pub fn new(
        config: EngineConfig,
        assets: Vec<AssetId>,
        feeds: Vec<PriceFeedId>,
        oracle: Rc<dyn PriceSource>,
        custodian: Rc<dyn AssetCustodian>,
        issuer: Rc<dyn DebtIssuer>,
    ) -> EngineResult<Self> {
        if assets.len() != feeds.len() {
            return Err(CdpError::ConfigLengthMismatch);
        }
        config.validate()?;

        let mut supported: Vec<SupportedAsset> = Vec::with_capacity(assets.len());
        for (asset, feed) in assets.into_iter().zip(feeds) {
            if supported.iter().any(|entry| entry.asset == asset) {
                return Err(CdpError::InvalidConfig {
                    reason: "duplicate collateral asset",
                });
            }
            supported.push(SupportedAsset { asset, feed });
        }

        info!(assets = supported.len(), "debt engine constructed");

        Ok(Self {
            config,
            assets: supported,
            ledger: RefCell::new(LedgerState::new()),
            events: RefCell::new(EventLog::new()),
            stats: RefCell::new(EngineStats::default()),
            lock: OperationLock::new(),
            oracle,
            custodian,
            issuer,
        })
    }

    /// Engine parameters, immutable since construction
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Supported assets in construction order
    pub fn supported_assets(&self) -> &[SupportedAsset] {
        &self.assets
    }

    // ===== Mutating operations =====

    /// Locks `amount` of `asset` as collateral for `caller`.
    pub fn deposit_collateral(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        self.mutating_op("deposit_collateral", |journal| {
            require_amount(amount)?;
            self.feed_for(asset)?;
            self.deposit_primitive(journal, caller, asset, amount)?;
            self.assert_account_safe(caller)?;
            self.bump(|stats| stats.deposits += 1);
            Ok(())
        })
    }

    /// Deposits collateral and mints debt against it as one atomic unit.
    pub fn deposit_collateral_and_mint(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> EngineResult<()> {
        self.mutating_op("deposit_collateral_and_mint", |journal| {
            require_amount(collateral_amount)?;
            require_amount(debt_amount)?;
            self.feed_for(asset)?;
            self.deposit_primitive(journal, caller, asset, collateral_amount)?;
            self.mint_primitive(journal, caller, debt_amount)?;
            self.bump(|stats| {
                stats.deposits += 1;
                stats.mints += 1;
                stats.debt_minted_volume = stats.debt_minted_volume.saturating_add(debt_amount);
            });
            Ok(())
        })
    }

    /// Returns `amount` of `asset` from `caller`'s collateral to them.
    pub fn redeem_collateral(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        self.mutating_op("redeem_collateral", |journal| {
            require_amount(amount)?;
            self.feed_for(asset)?;
            self.withdraw_primitive(journal, caller, caller, asset, amount)?;
            self.assert_account_safe(caller)?;
            self.bump(|stats| stats.redemptions += 1);
            Ok(())
        })
    }

    /// Burns debt and redeems collateral as one atomic unit.
    pub fn redeem_collateral_for_debt(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> EngineResult<()> {
        self.mutating_op("redeem_collateral_for_debt", |journal| {
            require_amount(collateral_amount)?;
            require_amount(debt_amount)?;
            self.feed_for(asset)?;
            self.burn_primitive(journal, caller, caller, debt_amount)?;
            self.withdraw_primitive(journal, caller, caller, asset, collateral_amount)?;
            self.assert_account_safe(caller)?;
            self.bump(|stats| {
                stats.burns += 1;
                stats.redemptions += 1;
                stats.debt_burned_volume = stats.debt_burned_volume.saturating_add(debt_amount);
            });
            Ok(())
        })
    }

    /// Mints `amount` debt for `caller` against their collateral.
    pub fn mint_debt(&self, caller: &AccountId, amount: u128) -> EngineResult<()> {
        self.mutating_op("mint_debt", |journal| {
            require_amount(amount)?;
            self.mint_primitive(journal, caller, amount)?;
            self.bump(|stats| {
                stats.mints += 1;
                stats.debt_minted_volume = stats.debt_minted_volume.saturating_add(amount);
            });
            Ok(())
        })
    }

    /// Repays `amount` of `caller`'s own debt.
    pub fn burn_debt(&self, caller: &AccountId, amount: u128) -> EngineResult<()> {
        self.mutating_op("burn_debt", |journal| {
            require_amount(amount)?;
            self.burn_primitive(journal, caller, caller, amount)?;
            self.assert_account_safe(caller)?;
            self.bump(|stats| {
                stats.burns += 1;
                stats.debt_burned_volume = stats.debt_burned_volume.saturating_add(amount);
            });
            Ok(())
        })
    }

    /// Seizes collateral from an unsafe borrower in exchange for repaying
    /// `debt_to_cover` of their debt, plus the liquidation bonus.
    pub fn liquidate(
        &self,
        liquidator: &AccountId,
        collateral_asset: &AssetId,
        borrower: &AccountId,
        debt_to_cover: u128,
    ) -> EngineResult<()> {
        self.mutating_op("liquidate", |journal| {
            require_amount(debt_to_cover)?;

            let starting_health = self.account_health_factor(borrower)?;
            if starting_health >= self.config.min_health_factor {
                return Err(CdpError::HealthIsOkay);
            }

            let token_amount = self.asset_amount_from_usd(collateral_asset, debt_to_cover)?;
            let bonus = math::percent_of(token_amount, self.config.liquidation_bonus)?;
            let total_seized = token_amount
                .checked_add(bonus)
                .ok_or(CdpError::ArithmeticOverflow)?;

            self.withdraw_primitive(journal, borrower, liquidator, collateral_asset, total_seized)?;
            self.burn_primitive(journal, borrower, liquidator, debt_to_cover)?;

            let ending_health = self.account_health_factor(borrower)?;
            if ending_health <= starting_health {
                return Err(CdpError::HealthFactorNotImproved);
            }
            // The liquidator may be a borrower of this same engine; their
            // own position must stay safe too.
            self.assert_account_safe(liquidator)?;

            journal.stage(&AccountLiquidated {
                borrower: *borrower,
                liquidator: *liquidator,
                asset: *collateral_asset,
                debt_covered: debt_to_cover,
                collateral_seized: total_seized,
            });
            info!(
                borrower = %borrower,
                liquidator = %liquidator,
                asset = %collateral_asset,
                debt_covered = debt_to_cover,
                collateral_seized = total_seized,
                starting_health,
                ending_health,
                "account liquidated"
            );
            self.bump(|stats| {
                stats.redemptions += 1;
                stats.burns += 1;
                stats.liquidations += 1;
                stats.debt_burned_volume = stats.debt_burned_volume.saturating_add(debt_to_cover);
                stats.collateral_seized_volume =
                    stats.collateral_seized_volume.saturating_add(total_seized);
            });
            Ok(())
        })
    }

    // ===== Read-only queries =====

    /// USD value (scaled by the engine precision) of `amount` of `asset`
    pub fn usd_value(&self, asset: &AssetId, amount: u128) -> EngineResult<u128> {
        let reading = self.read_price(asset)?;
        oracle::usd_value(amount, &reading, &self.config)
    }

    /// Asset units worth `usd` (scaled) at the current price
    pub fn asset_amount_from_usd(&self, asset: &AssetId, usd: u128) -> EngineResult<u128> {
        let reading = self.read_price(asset)?;
        oracle::asset_amount_from_usd(usd, &reading, &self.config)
    }

    /// Total USD value (scaled) of every collateral balance of `account`
    pub fn account_collateral_value_usd(&self, account: &AccountId) -> EngineResult<u128> {
        // Balances are snapshotted first so no ledger borrow is held across
        // the price reads.
        let balances: Vec<(AssetId, u128)> = {
            let ledger = self.ledger.borrow();
            self.assets
                .iter()
                .map(|entry| (entry.asset, ledger.collateral_balance(account, &entry.asset)))
                .collect()
        };

        let mut total: u128 = 0;
        for (asset, balance) in balances {
            if balance == 0 {
                continue;
            }
            let value = self.usd_value(&asset, balance)?;
            total = total
                .checked_add(value)
                .ok_or(CdpError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    /// Outstanding debt and total collateral value of `account`
    pub fn account_info(&self, account: &AccountId) -> EngineResult<(u128, u128)> {
        let debt = self.ledger.borrow().debt_of(account);
        let collateral_value = self.account_collateral_value_usd(account)?;
        Ok((debt, collateral_value))
    }

    /// Current health factor of `account`
    pub fn account_health_factor(&self, account: &AccountId) -> EngineResult<u128> {
        let debt = self.ledger.borrow().debt_of(account);
        if debt == 0 {
            return Ok(u128::MAX);
        }
        let collateral_value = self.account_collateral_value_usd(account)?;
        compute_health_factor(debt, collateral_value, &self.config)
    }

    /// Health factor from explicit inputs under this engine's parameters
    pub fn compute_health_factor(
        &self,
        debt_minted: u128,
        collateral_value_usd: u128,
    ) -> EngineResult<u128> {
        compute_health_factor(debt_minted, collateral_value_usd, &self.config)
    }

    /// Committed events since construction or the last drain
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.borrow().records().to_vec()
    }

    /// Hands committed events to an indexer; sequence numbers keep
    /// advancing across drains.
    pub fn drain_events(&self) -> Vec<EventRecord> {
        self.events.borrow_mut().drain()
    }

    /// Running totals of committed operations
    pub fn stats(&self) -> EngineStats {
        self.stats.borrow().clone()
    }

    // ===== Operation plumbing =====

    /// Runs one mutating operation under the lock and journal: on success
    /// the staged events are flushed, on failure every ledger write is
    /// undone and completed external calls are compensated.
    fn mutating_op<F>(&self, name: &'static str, operation: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Journal) -> EngineResult<()>,
    {
        let _guard = self.lock.enter()?;
        debug!(operation = name, "operation started");

        let mut journal = Journal::new();
        match operation(&mut journal) {
            Ok(()) => {
                let mut events = self.events.borrow_mut();
                for (event_type, payload) in journal.commit() {
                    events.append(event_type, payload);
                }
                info!(operation = name, "operation committed");
                Ok(())
            }
            Err(err) => {
                warn!(
                    operation = name,
                    error = %err,
                    code = ?err.code(),
                    "operation rolled back"
                );
                journal.unwind_ledgers(&mut self.ledger.borrow_mut());
                journal.unwind_externals(self.custodian.as_ref(), self.issuer.as_ref());
                Err(err)
            }
        }
    }

    /// Post-condition gate: fails the enclosing operation when `account`
    /// ends it unsafe.
    fn assert_account_safe(&self, account: &AccountId) -> EngineResult<()> {
        let health_factor = self.account_health_factor(account)?;
        if health_factor < self.config.min_health_factor {
            return Err(CdpError::HealthFactorBroken { health_factor });
        }
        Ok(())
    }

    /// Ledger credit + deposit event + external transfer-in.
    fn deposit_primitive(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        self.credit_collateral(journal, account, asset, amount)?;
        journal.stage(&CollateralDeposited {
            account: *account,
            asset: *asset,
            amount,
        });

        self.custodian
            .transfer_in(account, asset, amount)
            .map_err(|err| {
                warn!(account = %account, asset = %asset, amount, error = %err, "transfer-in failed");
                CdpError::TransferFailed
            })?;
        journal.note_compensation(Compensation::ReturnCollateral {
            to: *account,
            asset: *asset,
            amount,
        });
        Ok(())
    }

    /// Ledger debit + redeemed event + external transfer-out to
    /// `recipient`. Shared by redemption and liquidation seizure.
    fn withdraw_primitive(
        &self,
        journal: &mut Journal,
        owner: &AccountId,
        recipient: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        self.debit_collateral(journal, owner, asset, amount)?;
        journal.stage(&CollateralRedeemed {
            from: *owner,
            to: *recipient,
            asset: *asset,
            amount,
        });

        self.custodian
            .transfer_out(recipient, asset, amount)
            .map_err(|err| {
                warn!(recipient = %recipient, asset = %asset, amount, error = %err, "transfer-out failed");
                CdpError::TransferFailed
            })?;
        journal.note_compensation(Compensation::ReclaimCollateral {
            from: *recipient,
            asset: *asset,
            amount,
        });
        Ok(())
    }

    /// Debt credit + safety gate + external issuance.
    ///
    /// Issuance is the final external step of every operation that mints,
    /// so no compensation is recorded for it.
    fn mint_primitive(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        amount: u128,
    ) -> EngineResult<()> {
        self.credit_debt(journal, account, amount)?;
        journal.stage(&DebtMinted {
            account: *account,
            amount,
        });
        self.assert_account_safe(account)?;

        self.issuer.issue(account, amount).map_err(|err| {
            warn!(account = %account, amount, error = %err, "debt issuance failed");
            CdpError::MintFailed
        })?;
        Ok(())
    }

    /// Debt debit + external pull from `payer` + destruction.
    fn burn_primitive(
        &self,
        journal: &mut Journal,
        on_behalf_of: &AccountId,
        payer: &AccountId,
        amount: u128,
    ) -> EngineResult<()> {
        self.debit_debt(journal, on_behalf_of, amount)?;
        journal.stage(&DebtBurned {
            on_behalf_of: *on_behalf_of,
            payer: *payer,
            amount,
        });

        self.issuer.pull(payer, amount).map_err(|err| {
            warn!(payer = %payer, amount, error = %err, "debt token pull failed");
            CdpError::TransferFailed
        })?;
        journal.note_compensation(Compensation::ReleaseDebt {
            to: *payer,
            amount,
        });

        self.issuer.destroy(amount).map_err(|err| {
            warn!(amount, error = %err, "debt destruction failed");
            CdpError::BurnFailed
        })?;
        // Once destroyed, undoing the burn means issuing replacements.
        journal.replace_last_compensation(Compensation::ReissueDebt {
            to: *payer,
            amount,
        });
        Ok(())
    }

    fn credit_collateral(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        journal.note_collateral(*account, *asset, ledger.collateral_balance(account, asset));
        ledger.credit_collateral(account, asset, amount)
    }

    fn debit_collateral(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> EngineResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        journal.note_collateral(*account, *asset, ledger.collateral_balance(account, asset));
        ledger.debit_collateral(account, asset, amount)
    }

    fn credit_debt(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        amount: u128,
    ) -> EngineResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        journal.note_debt(*account, ledger.debt_of(account));
        ledger.credit_debt(account, amount)
    }

    fn debit_debt(
        &self,
        journal: &mut Journal,
        account: &AccountId,
        amount: u128,
    ) -> EngineResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        journal.note_debt(*account, ledger.debt_of(account));
        ledger.debit_debt(account, amount)
    }

    fn feed_for(&self, asset: &AssetId) -> EngineResult<PriceFeedId> {
        self.assets
            .iter()
            .find(|entry| entry.asset == *asset)
            .map(|entry| entry.feed)
            .ok_or(CdpError::UnsupportedAsset)
    }

    fn read_price(&self, asset: &AssetId) -> EngineResult<PriceReading> {
        let feed = self.feed_for(asset)?;
        oracle::read_price(self.oracle.as_ref(), &feed, &self.config)
    }

    fn bump<F: FnOnce(&mut EngineStats)>(&self, update: F) {
        update(&mut self.stats.borrow_mut());
    }
}

fn require_amount(amount: u128) -> EngineResult<()> {
    if amount == 0 {
        return Err(CdpError::InvalidAmount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRECISION;

    #[test]
    fn test_zero_debt_is_always_safe() {
        let config = EngineConfig::default();
        assert_eq!(compute_health_factor(0, 0, &config).unwrap(), u128::MAX);
        assert_eq!(
            compute_health_factor(0, 30_000 * PRECISION, &config).unwrap(),
            u128::MAX
        );
    }

    #[test]
    fn test_health_factor_scales_with_threshold() {
        // $30000 collateral at a 50% threshold backs $10000 of debt at 1.5.
        let config = EngineConfig::default();
        let hf = compute_health_factor(10_000 * PRECISION, 30_000 * PRECISION, &config).unwrap();
        assert_eq!(hf, 3 * PRECISION / 2);
    }

    #[test]
    fn test_health_factor_boundary_is_exact() {
        // Debt equal to exactly half the collateral value sits at 1.0.
        let config = EngineConfig::default();
        let hf = compute_health_factor(10_000 * PRECISION, 20_000 * PRECISION, &config).unwrap();
        assert_eq!(hf, config.min_health_factor);
    }

    #[test]
    fn test_full_value_debt_is_unsafe() {
        let config = EngineConfig::default();
        let hf = compute_health_factor(20_000 * PRECISION, 20_000 * PRECISION, &config).unwrap();
        assert_eq!(hf, PRECISION / 2);
        assert!(hf < config.min_health_factor);
    }

    #[test]
    fn test_dust_debt_saturates_health_factor() {
        // One wei of debt against $20000: the true ratio is 1e40, beyond
        // u128, and reads as the saturated maximum.
        let config = EngineConfig::default();
        assert_eq!(
            compute_health_factor(1, 20_000 * PRECISION, &config).unwrap(),
            u128::MAX
        );
    }
}
