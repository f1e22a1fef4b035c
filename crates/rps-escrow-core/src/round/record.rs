//! Round record.

use crate::crypto::{Commitment, Salt};
use crate::games::{Move, Outcome};
use crate::protocol::{Address, Amount, RoundId, Seat};
use serde::{Deserialize, Serialize};

/// Lifecycle position of a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Creator seated and staked, waiting for an opponent
    Created,
    /// Both players staked, commitments open
    Joined,
    /// Both commitments stored, reveals open
    Committed,
    /// One reveal stored
    Revealed,
    /// Paid out. Terminal.
    Resolved,
}

/// A revealed move together with the salt that opened the commitment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    #[serde(rename = "move")]
    pub mv: Move,
    pub salt: Salt,
}

/// One seat at the table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub address: Address,
    pub commitment: Option<Commitment>,
    pub reveal: Option<Reveal>,
}

impl PlayerSlot {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            commitment: None,
            reveal: None,
        }
    }
}

/// One game between two players
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// Stake each player posts; fixed at creation
    pub wager: Amount,
    pub players: Vec<PlayerSlot>,
    pub phase: Phase,
    /// Total escrowed for this round
    pub pot: Amount,
    pub outcome: Option<Outcome>,
    /// Total transferred out on resolution
    pub paid_out: Amount,
}

impl Round {
    pub const MAX_PLAYERS: usize = 2;

    /// A freshly created round: the creator holds the first seat and has posted the wager
    pub fn open(id: RoundId, wager: Amount, creator: Address) -> Self {
        Self {
            id,
            wager,
            players: vec![PlayerSlot::new(creator)],
            phase: Phase::Created,
            pot: wager,
            outcome: None,
            paid_out: 0,
        }
    }

    pub fn seat_of(&self, address: &Address) -> Option<Seat> {
        self.players
            .iter()
            .position(|slot| slot.address == *address)
            .map(|index| if index == 0 { Seat::First } else { Seat::Second })
    }

    pub fn player(&self, seat: Seat) -> Option<&PlayerSlot> {
        self.players.get(seat.index())
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= Self::MAX_PLAYERS
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == Phase::Resolved
    }

    pub fn both_committed(&self) -> bool {
        self.is_full() && self.players.iter().all(|p| p.commitment.is_some())
    }

    pub fn both_revealed(&self) -> bool {
        self.is_full() && self.players.iter().all(|p| p.reveal.is_some())
    }

    /// Address of the winner, once resolved decisively
    pub fn winner(&self) -> Option<Address> {
        let seat = match self.outcome? {
            Outcome::Player1Wins => Seat::First,
            Outcome::Player2Wins => Seat::Second,
            Outcome::Tie => return None,
        };
        self.player(seat).map(|slot| slot.address)
    }

    /// Amount still held in escrow for this round
    pub fn escrowed(&self) -> Amount {
        if self.is_resolved() {
            0
        } else {
            self.pot
        }
    }
}
