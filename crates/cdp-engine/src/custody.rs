//! External custody capabilities
//!
//! The engine never moves assets itself. Collateral custody and debt-token
//! issuance are capability traits injected at construction; failures cross
//! this boundary as `anyhow` errors and the engine maps them onto its own
//! error taxonomy.

use crate::state::{AccountId, AssetId};

/// Moves collateral between participant wallets and engine custody
pub trait AssetCustodian {
    /// Pulls `amount` of `asset` from `from` into custody
    fn transfer_in(&self, from: &AccountId, asset: &AssetId, amount: u128) -> anyhow::Result<()>;

    /// Pays `amount` of `asset` out of custody to `to`
    fn transfer_out(&self, to: &AccountId, asset: &AssetId, amount: u128) -> anyhow::Result<()>;
}

/// Mint and burn authority over the synthetic debt token
pub trait DebtIssuer {
    /// Issues `amount` freshly minted debt tokens to `to`
    fn issue(&self, to: &AccountId, amount: u128) -> anyhow::Result<()>;

    /// Pulls `amount` debt tokens from `from` into custody ahead of
    /// destruction
    fn pull(&self, from: &AccountId, amount: u128) -> anyhow::Result<()>;

    /// Destroys `amount` debt tokens held in custody
    fn destroy(&self, amount: u128) -> anyhow::Result<()>;

    /// Hands `amount` custody-held debt tokens back to `to` undestroyed
    fn release(&self, to: &AccountId, amount: u128) -> anyhow::Result<()>;
}
