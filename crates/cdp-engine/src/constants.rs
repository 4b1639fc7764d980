//! Engine constants
//!
//! Fixed-point scales and risk parameters shared across the engine

/// Internal fixed-point precision (18 decimals)
pub const PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18

/// Scale factor reconciling 8-decimal oracle prices with PRECISION
pub const ORACLE_PRECISION_ADJUSTMENT: u128 = 10_000_000_000; // 1e10

/// Decimal precision expected from price feeds
pub const ORACLE_DECIMALS: u8 = 8;

/// Fraction of raw collateral value counted toward the health factor
pub const LIQUIDATION_THRESHOLD: u64 = 50; // percent

/// Extra collateral awarded to a liquidator
pub const LIQUIDATION_BONUS: u64 = 10; // percent

/// Health factor floor, scaled by PRECISION
pub const MIN_HEALTH_FACTOR: u128 = PRECISION; // 1.0

/// Maximum accepted price age in seconds
pub const MAX_PRICE_AGE_SECS: u64 = 300; // 5 minutes

/// Divisor for percent-denominated parameters
pub const PERCENT_DIVISOR: u128 = 100;
