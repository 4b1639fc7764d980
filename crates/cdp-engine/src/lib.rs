// Collateralized-debt engine
//
// Accounts lock priced collateral assets and mint a pegged synthetic debt
// token against them. Every mutating operation ends with the account at or
// above the minimum health factor, or the operation fails and is fully
// undone. Unsafe accounts can be liquidated by third parties for a bonus.

pub mod constants;
pub mod custody;
pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod journal;
pub mod math;
pub mod oracle;
pub mod state;

pub use custody::{AssetCustodian, DebtIssuer};
pub use engine::{compute_health_factor, CdpEngine};
pub use error::{CdpError, EngineResult, ErrorCode};
pub use events::{
    AccountLiquidated, CollateralDeposited, CollateralRedeemed, DebtBurned, DebtMinted, Event,
    EventLog, EventRecord, EventType,
};
pub use oracle::{PriceReading, PriceSource};
pub use state::{
    AccountId, AssetId, EngineConfig, EngineStats, LedgerState, PriceFeedId, SupportedAsset,
};
