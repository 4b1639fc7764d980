//! Error types for the debt engine
//!
//! Every failure aborts the enclosing operation with no observable state
//! change; none of these conditions poison the engine for later callers.

use num_derive::FromPrimitive;
use thiserror::Error;

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, CdpError>;

/// Custom error type for the debt engine
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CdpError {
    // Input validation errors
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Asset is not supported by this engine")]
    UnsupportedAsset,

    #[error("Asset and price feed lists differ in length")]
    ConfigLengthMismatch,

    #[error("Configuration rejected: {reason}")]
    InvalidConfig { reason: &'static str },

    // Balance errors
    #[error("Insufficient collateral balance")]
    InsufficientCollateral,

    #[error("Insufficient outstanding debt")]
    InsufficientDebt,

    // External facility errors
    #[error("External asset transfer failed")]
    TransferFailed,

    #[error("External debt issuance failed")]
    MintFailed,

    #[error("External debt destruction failed")]
    BurnFailed,

    #[error("No usable price for the requested feed")]
    OracleUnavailable,

    #[error("Price reading is older than the configured maximum age")]
    StalePrice,

    // Invariant errors
    #[error("Health factor {health_factor} is below the minimum")]
    HealthFactorBroken { health_factor: u128 },

    #[error("Account health factor is not below the minimum")]
    HealthIsOkay,

    #[error("Liquidation did not improve the borrower's health factor")]
    HealthFactorNotImproved,

    // Engine state errors
    #[error("Nested call rejected while an operation is in progress")]
    ReentrancyDetected,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Division by zero")]
    DivisionByZero,
}

/// Stable numeric code for every error variant
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum ErrorCode {
    // Input validation errors (6000-6009)
    InvalidAmount = 6000,
    UnsupportedAsset = 6001,
    ConfigLengthMismatch = 6002,
    InvalidConfig = 6003,

    // Balance errors (6010-6019)
    InsufficientCollateral = 6010,
    InsufficientDebt = 6011,

    // External facility errors (6020-6029)
    TransferFailed = 6020,
    MintFailed = 6021,
    BurnFailed = 6022,
    OracleUnavailable = 6023,
    StalePrice = 6024,

    // Invariant errors (6030-6039)
    HealthFactorBroken = 6030,
    HealthIsOkay = 6031,
    HealthFactorNotImproved = 6032,

    // Engine state errors (6040-6049)
    ReentrancyDetected = 6040,
    ArithmeticOverflow = 6041,
    DivisionByZero = 6042,
}

impl CdpError {
    /// Stable code for logs and embedders
    pub fn code(&self) -> ErrorCode {
        match self {
            CdpError::InvalidAmount => ErrorCode::InvalidAmount,
            CdpError::UnsupportedAsset => ErrorCode::UnsupportedAsset,
            CdpError::ConfigLengthMismatch => ErrorCode::ConfigLengthMismatch,
            CdpError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            CdpError::InsufficientCollateral => ErrorCode::InsufficientCollateral,
            CdpError::InsufficientDebt => ErrorCode::InsufficientDebt,
            CdpError::TransferFailed => ErrorCode::TransferFailed,
            CdpError::MintFailed => ErrorCode::MintFailed,
            CdpError::BurnFailed => ErrorCode::BurnFailed,
            CdpError::OracleUnavailable => ErrorCode::OracleUnavailable,
            CdpError::StalePrice => ErrorCode::StalePrice,
            CdpError::HealthFactorBroken { .. } => ErrorCode::HealthFactorBroken,
            CdpError::HealthIsOkay => ErrorCode::HealthIsOkay,
            CdpError::HealthFactorNotImproved => ErrorCode::HealthFactorNotImproved,
            CdpError::ReentrancyDetected => ErrorCode::ReentrancyDetected,
            CdpError::ArithmeticOverflow => ErrorCode::ArithmeticOverflow,
            CdpError::DivisionByZero => ErrorCode::DivisionByZero,
        }
    }
}
