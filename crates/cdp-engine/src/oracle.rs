//! Price oracle adapter
//!
//! Normalizes external price readings onto the engine's fixed-point scale
//! and rejects readings the engine cannot safely use.

use tracing::warn;

use crate::error::{CdpError, EngineResult};
use crate::math;
use crate::state::{EngineConfig, PriceFeedId};

/// One price observation from an external feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
    /// Price in the feed's native decimal precision
    pub price: u64,
    /// Native decimal precision of `price`
    pub decimals: u8,
    /// Seconds elapsed since the reading was published
    pub age_secs: u64,
}

/// External price feed capability, injected at construction.
///
/// Read-only: implementations must not call back into mutating engine
/// operations (such calls are rejected while an operation is in flight).
pub trait PriceSource {
    /// Current reading for one feed
    fn price(&self, feed: &PriceFeedId) -> anyhow::Result<PriceReading>;
}

/// Obtains and validates a reading for `feed`.
///
/// A reading with a zero price or the wrong decimal precision is unusable
/// and reported as `OracleUnavailable`; one older than the configured
/// window is reported as `StalePrice`.
pub(crate) fn read_price(
    source: &dyn PriceSource,
    feed: &PriceFeedId,
    config: &EngineConfig,
) -> EngineResult<PriceReading> {
    let reading = source.price(feed).map_err(|err| {
        warn!(feed = %feed, error = %err, "price source failed");
        CdpError::OracleUnavailable
    })?;

    if reading.price == 0 || reading.decimals != config.oracle_decimals {
        warn!(
            feed = %feed,
            price = reading.price,
            decimals = reading.decimals,
            "unusable price reading"
        );
        return Err(CdpError::OracleUnavailable);
    }
    if let Some(max_age) = config.max_price_age_secs {
        if reading.age_secs > max_age {
            warn!(feed = %feed, age_secs = reading.age_secs, max_age, "stale price reading");
            return Err(CdpError::StalePrice);
        }
    }

    Ok(reading)
}

/// `amount * price * adjustment / precision`
pub(crate) fn usd_value(
    amount: u128,
    reading: &PriceReading,
    config: &EngineConfig,
) -> EngineResult<u128> {
    let price_scaled = scaled_price(reading, config)?;
    math::mul_div(amount, price_scaled, config.precision)
}

/// `usd * precision / (price * adjustment)`
pub(crate) fn asset_amount_from_usd(
    usd: u128,
    reading: &PriceReading,
    config: &EngineConfig,
) -> EngineResult<u128> {
    let price_scaled = scaled_price(reading, config)?;
    math::mul_div(usd, config.precision, price_scaled)
}

fn scaled_price(reading: &PriceReading, config: &EngineConfig) -> EngineResult<u128> {
    (reading.price as u128)
        .checked_mul(config.oracle_precision_adjustment)
        .ok_or(CdpError::ArithmeticOverflow)
}
