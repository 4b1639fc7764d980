//! Engine event log
//!
//! Borsh-framed events appended when an operation commits, ordered by
//! sequence number so an indexer can rebuild both ledgers from the log
//! alone. Nothing is emitted for failed operations.

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::debug;

use crate::state::{AccountId, AssetId};

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Collateral events
    CollateralDeposited = 1,
    CollateralRedeemed = 2,

    // Debt events
    DebtMinted = 10,
    DebtBurned = 11,

    // Liquidation events
    AccountLiquidated = 20,
}

/// Base event trait
pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    /// Borsh payload appended to the log
    fn payload(&self) -> Vec<u8> {
        self.try_to_vec().unwrap_or_default()
    }
}

/// Macro for event definition
#[macro_export]
macro_rules! define_event {
    ($name:ident { $($field:ident: $type:ty),* $(,)? }) => {
        #[derive(::borsh::BorshSerialize, ::borsh::BorshDeserialize, Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $type,)*
        }

        impl $crate::events::Event for $name {
            fn event_type() -> $crate::events::EventType {
                $crate::events::EventType::$name
            }
        }
    };
}

define_event!(CollateralDeposited {
    account: AccountId,
    asset: AssetId,
    amount: u128,
});

define_event!(CollateralRedeemed {
    from: AccountId,
    to: AccountId,
    asset: AssetId,
    amount: u128,
});

define_event!(DebtMinted {
    account: AccountId,
    amount: u128,
});

define_event!(DebtBurned {
    on_behalf_of: AccountId,
    payer: AccountId,
    amount: u128,
});

define_event!(AccountLiquidated {
    borrower: AccountId,
    liquidator: AccountId,
    asset: AssetId,
    debt_covered: u128,
    collateral_seized: u128,
});

/// One committed event
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Position in the log, starting at zero
    pub seq: u64,
    /// Discriminator for `payload`
    pub event_type: EventType,
    /// Borsh-encoded event struct
    pub payload: Vec<u8>,
}

/// Ordered log of committed events
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one framed event
    pub fn append(&mut self, event_type: EventType, payload: Vec<u8>) {
        let record = EventRecord {
            seq: self.next_seq,
            event_type,
            payload,
        };
        debug!(seq = record.seq, event = ?event_type, "event committed");
        self.next_seq += 1;
        self.records.push(record);
    }

    /// Records retained since construction or the last drain
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Hands retained records to a consumer; sequence numbers keep
    /// advancing across drains.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }
}
