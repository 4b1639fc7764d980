//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use cdp_engine::constants::{ORACLE_DECIMALS, PRECISION};
use cdp_engine::{
    AccountId, AssetCustodian, AssetId, CdpEngine, DebtIssuer, EngineConfig, EngineResult,
    PriceFeedId, PriceReading, PriceSource,
};

pub fn account(n: u8) -> AccountId {
    AccountId::new([n; 32])
}

pub fn asset(n: u8) -> AssetId {
    AssetId::new([n; 32])
}

pub fn feed(n: u8) -> PriceFeedId {
    PriceFeedId::new([n; 32])
}

/// Whole asset units or whole dollars at the engine's 1e18 scale
pub fn units(n: u64) -> u128 {
    n as u128 * PRECISION
}

/// Whole dollars in the feed's native 8-decimal precision
pub fn usd_price(dollars: u64) -> u64 {
    dollars * 100_000_000
}

/// In-memory price source with per-feed readings and an offline switch
#[derive(Default)]
pub struct MockOracle {
    readings: RefCell<BTreeMap<PriceFeedId, PriceReading>>,
    offline: Cell<bool>,
}

impl MockOracle {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Fresh reading at the expected decimal precision
    pub fn set_price(&self, feed: PriceFeedId, price: u64) {
        self.set_reading(
            feed,
            PriceReading {
                price,
                decimals: ORACLE_DECIMALS,
                age_secs: 0,
            },
        );
    }

    pub fn set_reading(&self, feed: PriceFeedId, reading: PriceReading) {
        self.readings.borrow_mut().insert(feed, reading);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }
}

impl PriceSource for MockOracle {
    fn price(&self, feed: &PriceFeedId) -> anyhow::Result<PriceReading> {
        if self.offline.get() {
            anyhow::bail!("price source offline");
        }
        self.readings
            .borrow()
            .get(feed)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no reading for feed"))
    }
}

/// In-memory custody and issuance backend with balance enforcement and
/// per-call failure switches
#[derive(Default)]
pub struct MockBank {
    wallets: RefCell<BTreeMap<(AccountId, AssetId), u128>>,
    custody: RefCell<BTreeMap<AssetId, u128>>,
    debt_wallets: RefCell<BTreeMap<AccountId, u128>>,
    debt_custody: Cell<u128>,
    issued: Cell<u128>,
    destroyed: Cell<u128>,
    fail_transfer_in: Cell<bool>,
    fail_transfer_out: Cell<bool>,
    fail_issue: Cell<bool>,
    fail_pull: Cell<bool>,
    fail_destroy: Cell<bool>,
}

impl MockBank {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Seeds a participant wallet with collateral
    pub fn fund(&self, account: AccountId, asset: AssetId, amount: u128) {
        *self.wallets.borrow_mut().entry((account, asset)).or_insert(0) += amount;
    }

    /// Seeds a participant wallet with debt tokens acquired elsewhere
    pub fn fund_debt(&self, account: AccountId, amount: u128) {
        *self.debt_wallets.borrow_mut().entry(account).or_insert(0) += amount;
    }

    pub fn wallet_balance(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.wallets
            .borrow()
            .get(&(*account, *asset))
            .copied()
            .unwrap_or(0)
    }

    pub fn custody_balance(&self, asset: &AssetId) -> u128 {
        self.custody.borrow().get(asset).copied().unwrap_or(0)
    }

    pub fn debt_balance(&self, account: &AccountId) -> u128 {
        self.debt_wallets.borrow().get(account).copied().unwrap_or(0)
    }

    pub fn debt_custody(&self) -> u128 {
        self.debt_custody.get()
    }

    pub fn issued(&self) -> u128 {
        self.issued.get()
    }

    pub fn destroyed(&self) -> u128 {
        self.destroyed.get()
    }

    pub fn set_fail_transfer_in(&self, fail: bool) {
        self.fail_transfer_in.set(fail);
    }

    pub fn set_fail_transfer_out(&self, fail: bool) {
        self.fail_transfer_out.set(fail);
    }

    pub fn set_fail_issue(&self, fail: bool) {
        self.fail_issue.set(fail);
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.fail_pull.set(fail);
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.fail_destroy.set(fail);
    }
}

impl AssetCustodian for MockBank {
    fn transfer_in(&self, from: &AccountId, asset: &AssetId, amount: u128) -> anyhow::Result<()> {
        if self.fail_transfer_in.get() {
            anyhow::bail!("transfer-in rejected");
        }
        let mut wallets = self.wallets.borrow_mut();
        let balance = wallets.entry((*from, *asset)).or_insert(0);
        if *balance < amount {
            anyhow::bail!("wallet underfunded");
        }
        *balance -= amount;
        *self.custody.borrow_mut().entry(*asset).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_out(&self, to: &AccountId, asset: &AssetId, amount: u128) -> anyhow::Result<()> {
        if self.fail_transfer_out.get() {
            anyhow::bail!("transfer-out rejected");
        }
        let mut custody = self.custody.borrow_mut();
        let held = custody.entry(*asset).or_insert(0);
        if *held < amount {
            anyhow::bail!("custody underfunded");
        }
        *held -= amount;
        *self.wallets.borrow_mut().entry((*to, *asset)).or_insert(0) += amount;
        Ok(())
    }
}

impl DebtIssuer for MockBank {
    fn issue(&self, to: &AccountId, amount: u128) -> anyhow::Result<()> {
        if self.fail_issue.get() {
            anyhow::bail!("issuance rejected");
        }
        *self.debt_wallets.borrow_mut().entry(*to).or_insert(0) += amount;
        self.issued.set(self.issued.get() + amount);
        Ok(())
    }

    fn pull(&self, from: &AccountId, amount: u128) -> anyhow::Result<()> {
        if self.fail_pull.get() {
            anyhow::bail!("pull rejected");
        }
        let mut wallets = self.debt_wallets.borrow_mut();
        let balance = wallets.entry(*from).or_insert(0);
        if *balance < amount {
            anyhow::bail!("debt wallet underfunded");
        }
        *balance -= amount;
        self.debt_custody.set(self.debt_custody.get() + amount);
        Ok(())
    }

    fn destroy(&self, amount: u128) -> anyhow::Result<()> {
        if self.fail_destroy.get() {
            anyhow::bail!("destruction rejected");
        }
        if self.debt_custody.get() < amount {
            anyhow::bail!("debt custody underfunded");
        }
        self.debt_custody.set(self.debt_custody.get() - amount);
        self.destroyed.set(self.destroyed.get() + amount);
        Ok(())
    }

    fn release(&self, to: &AccountId, amount: u128) -> anyhow::Result<()> {
        if self.debt_custody.get() < amount {
            anyhow::bail!("debt custody underfunded");
        }
        self.debt_custody.set(self.debt_custody.get() - amount);
        *self.debt_wallets.borrow_mut().entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

/// Custodian whose transfer-in hook calls back into the engine, for
/// reentrancy coverage. Transfers themselves always succeed.
#[derive(Default)]
pub struct ReenteringCustodian {
    pub engine: RefCell<Option<Rc<CdpEngine>>>,
    pub nested_mutation: RefCell<Option<EngineResult<()>>>,
    pub nested_query: RefCell<Option<EngineResult<u128>>>,
}

impl AssetCustodian for ReenteringCustodian {
    fn transfer_in(&self, from: &AccountId, asset: &AssetId, _amount: u128) -> anyhow::Result<()> {
        if let Some(engine) = self.engine.borrow().as_ref() {
            self.nested_mutation
                .replace(Some(engine.deposit_collateral(from, asset, 1)));
            self.nested_query
                .replace(Some(engine.account_health_factor(from)));
        }
        Ok(())
    }

    fn transfer_out(&self, _to: &AccountId, _asset: &AssetId, _amount: u128) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Engine over `asset(1)` priced by `feed(1)` at $2000, default parameters
pub fn build_engine(oracle: Rc<MockOracle>, bank: Rc<MockBank>) -> Rc<CdpEngine> {
    oracle.set_price(feed(1), usd_price(2_000));
    let engine = CdpEngine::new(
        EngineConfig::default(),
        vec![asset(1)],
        vec![feed(1)],
        oracle,
        bank.clone(),
        bank,
    )
    .unwrap();
    Rc::new(engine)
}
