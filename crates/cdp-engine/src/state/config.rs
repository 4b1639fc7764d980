//! Engine configuration
//!
//! Risk parameters and fixed-point scales, fixed at construction and never
//! mutated afterward.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::constants::{
    LIQUIDATION_BONUS, LIQUIDATION_THRESHOLD, MAX_PRICE_AGE_SECS, MIN_HEALTH_FACTOR,
    ORACLE_DECIMALS, ORACLE_PRECISION_ADJUSTMENT, PRECISION,
};
use crate::error::{CdpError, EngineResult};
use crate::state::{AssetId, PriceFeedId};

/// A collateral asset admitted at construction
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedAsset {
    /// Collateral asset identity
    pub asset: AssetId,
    /// Price feed consulted for this asset
    pub feed: PriceFeedId,
}

/// Engine-wide parameters
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Internal fixed-point precision
    pub precision: u128,
    /// Multiplier lifting native oracle prices to `precision`
    pub oracle_precision_adjustment: u128,
    /// Decimal precision required of price readings
    pub oracle_decimals: u8,
    /// Percent of raw collateral value counted toward the health factor
    pub liquidation_threshold: u64,
    /// Percent bonus awarded to liquidators on seized collateral
    pub liquidation_bonus: u64,
    /// Minimum safe health factor, scaled by `precision`
    pub min_health_factor: u128,
    /// Maximum accepted price age; `None` accepts readings of any age
    pub max_price_age_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: PRECISION,
            oracle_precision_adjustment: ORACLE_PRECISION_ADJUSTMENT,
            oracle_decimals: ORACLE_DECIMALS,
            liquidation_threshold: LIQUIDATION_THRESHOLD,
            liquidation_bonus: LIQUIDATION_BONUS,
            min_health_factor: MIN_HEALTH_FACTOR,
            max_price_age_secs: Some(MAX_PRICE_AGE_SECS),
        }
    }
}

impl EngineConfig {
    /// Rejects parameter combinations the valuation arithmetic cannot
    /// support.
    pub fn validate(&self) -> EngineResult<()> {
        if self.precision == 0 {
            return Err(CdpError::InvalidConfig {
                reason: "precision must be non-zero",
            });
        }
        if self.liquidation_threshold == 0 || self.liquidation_threshold > 100 {
            return Err(CdpError::InvalidConfig {
                reason: "liquidation threshold must be within 1..=100 percent",
            });
        }
        if self.liquidation_bonus > 100 {
            return Err(CdpError::InvalidConfig {
                reason: "liquidation bonus must be at most 100 percent",
            });
        }
        if self.min_health_factor == 0 {
            return Err(CdpError::InvalidConfig {
                reason: "minimum health factor must be non-zero",
            });
        }

        // Native feed precision times the adjustment must land exactly on
        // the engine precision, or every valuation would be mis-scaled.
        let feed_scale = 10u128
            .checked_pow(self.oracle_decimals as u32)
            .ok_or(CdpError::InvalidConfig {
                reason: "oracle decimals too large",
            })?;
        if feed_scale.checked_mul(self.oracle_precision_adjustment) != Some(self.precision) {
            return Err(CdpError::InvalidConfig {
                reason: "oracle adjustment does not lift feed precision to engine precision",
            });
        }

        Ok(())
    }
}
