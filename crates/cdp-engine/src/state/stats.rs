//! Engine running totals

use borsh::{BorshDeserialize, BorshSerialize};

/// Primitive-operation counters and volumes, updated when operations
/// commit. Composed operations bump every primitive they contain, so a
/// liquidation counts one redemption, one burn, and one liquidation.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Committed collateral deposits
    pub deposits: u64,
    /// Committed collateral redemptions, liquidation seizures included
    pub redemptions: u64,
    /// Committed debt mints
    pub mints: u64,
    /// Committed debt burns, liquidation repayments included
    pub burns: u64,
    /// Committed liquidations
    pub liquidations: u64,
    /// Cumulative debt issued
    pub debt_minted_volume: u128,
    /// Cumulative debt destroyed
    pub debt_burned_volume: u128,
    /// Cumulative collateral seized by liquidators
    pub collateral_seized_volume: u128,
}
