//! Contract events.

use crate::games::{Move, Outcome};
use crate::protocol::{Address, Amount, RoundId};
use serde::{Deserialize, Serialize};

/// Event emitted by the escrow contract, one per state transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundCreated {
        round_id: RoundId,
        wager: Amount,
    },
    PlayerJoined {
        round_id: RoundId,
        player: Address,
    },
    MoveCommitted {
        round_id: RoundId,
        player: Address,
    },
    MoveRevealed {
        round_id: RoundId,
        player: Address,
        #[serde(rename = "move")]
        mv: Move,
    },
    RoundResolved {
        round_id: RoundId,
        outcome: Outcome,
        /// `None` on a tie
        winner: Option<Address>,
    },
    Payout {
        round_id: RoundId,
        recipient: Address,
        amount: Amount,
    },
}

impl RoundEvent {
    pub fn round_id(&self) -> RoundId {
        match self {
            RoundEvent::RoundCreated { round_id, .. }
            | RoundEvent::PlayerJoined { round_id, .. }
            | RoundEvent::MoveCommitted { round_id, .. }
            | RoundEvent::MoveRevealed { round_id, .. }
            | RoundEvent::RoundResolved { round_id, .. }
            | RoundEvent::Payout { round_id, .. } => *round_id,
        }
    }
}
