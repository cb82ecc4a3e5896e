//! Audit events emitted after each successful ledger operation.

use serde::{Deserialize, Serialize};

use crate::types::{Address, PositionId, Timestamp};

/// Observable ledger event, carrying owner, position and relevant amounts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LedgerEvent {
    PositionOpened {
        owner: Address,
        id: PositionId,
        amount: u128,
        lock_months: u32,
        unlock_at: Timestamp,
        boosted: bool,
    },
    StakeIncreased {
        owner: Address,
        id: PositionId,
        amount: u128,
        new_principal: u128,
        boosted: bool,
    },
    LockExtended {
        owner: Address,
        id: PositionId,
        old_months: u32,
        new_months: u32,
        unlock_at: Timestamp,
    },
    RewardsClaimed {
        owner: Address,
        id: PositionId,
        reward: u128,
        points_added: u128,
        total_points: u128,
    },
    RewardsCompounded {
        owner: Address,
        id: PositionId,
        reward: u128,
        points_added: u128,
        new_principal: u128,
    },
    PositionClosed {
        owner: Address,
        id: PositionId,
        principal: u128,
        reward: u128,
    },
    PositionMigrated {
        owner: Address,
        id: PositionId,
        target: Address,
        principal: u128,
        reward: u128,
        final_points: u128,
    },
    FundingAdded {
        from: Address,
        amount: u128,
    },
    RewardsNotified {
        amount: u128,
    },
    FundingRecovered {
        to: Address,
        amount: u128,
    },
    NextSuccessorSet {
        successor: Option<Address>,
    },
}

impl LedgerEvent {
    /// Short kebab-case name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PositionOpened { .. } => "position-opened",
            Self::StakeIncreased { .. } => "stake-increased",
            Self::LockExtended { .. } => "lock-extended",
            Self::RewardsClaimed { .. } => "rewards-claimed",
            Self::RewardsCompounded { .. } => "rewards-compounded",
            Self::PositionClosed { .. } => "position-closed",
            Self::PositionMigrated { .. } => "position-migrated",
            Self::FundingAdded { .. } => "funding-added",
            Self::RewardsNotified { .. } => "rewards-notified",
            Self::FundingRecovered { .. } => "funding-recovered",
            Self::NextSuccessorSet { .. } => "next-successor-set",
        }
    }
}
