//! Round operation errors.

use crate::protocol::{Address, Amount, RoundId};
use thiserror::Error;

/// Rejection of a contract operation. State is unchanged whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("Round {0} already exists")]
    RoundAlreadyExists(RoundId),

    #[error("Round {0} does not exist")]
    RoundDoesNotExist(RoundId),

    #[error("Round {0} already has two players")]
    RoundFull(RoundId),

    #[error("{player} already joined round {round_id}")]
    AlreadyParticipant { round_id: RoundId, player: Address },

    #[error("Escrow account {player} cannot take a seat in round {round_id}")]
    EscrowCannotPlay { round_id: RoundId, player: Address },

    #[error("{player} is not playing in round {round_id}")]
    NotAParticipant { round_id: RoundId, player: Address },

    #[error("Round {0} is still waiting for a second player")]
    AwaitingOpponent(RoundId),

    #[error("{player} already committed a move in round {round_id}")]
    AlreadyCommitted { round_id: RoundId, player: Address },

    #[error("Round {0} is waiting for both commitments before reveals")]
    CommitmentsPending(RoundId),

    #[error("{player} already revealed in round {round_id}")]
    AlreadyRevealed { round_id: RoundId, player: Address },

    #[error("Reveal by {player} does not match the stored commitment in round {round_id}")]
    CommitmentMismatch { round_id: RoundId, player: Address },

    #[error("Round {0} is already resolved")]
    RoundAlreadyResolved(RoundId),

    #[error("Round {0} is not resolved yet")]
    RoundNotResolved(RoundId),

    #[error("Pot of round {0} would overflow")]
    PotOverflow(RoundId),

    #[error("Token transfer of {amount} for {account} in round {round_id} failed: {reason}")]
    TokenTransferFailed {
        round_id: RoundId,
        account: Address,
        amount: Amount,
        reason: String,
    },
}

impl RoundError {
    /// Round the rejected operation targeted
    pub fn round_id(&self) -> RoundId {
        match self {
            RoundError::RoundAlreadyExists(id)
            | RoundError::RoundDoesNotExist(id)
            | RoundError::RoundFull(id)
            | RoundError::AwaitingOpponent(id)
            | RoundError::CommitmentsPending(id)
            | RoundError::RoundAlreadyResolved(id)
            | RoundError::RoundNotResolved(id)
            | RoundError::PotOverflow(id) => *id,
            RoundError::AlreadyParticipant { round_id, .. }
            | RoundError::EscrowCannotPlay { round_id, .. }
            | RoundError::NotAParticipant { round_id, .. }
            | RoundError::AlreadyCommitted { round_id, .. }
            | RoundError::AlreadyRevealed { round_id, .. }
            | RoundError::CommitmentMismatch { round_id, .. }
            | RoundError::TokenTransferFailed { round_id, .. } => *round_id,
        }
    }
}
