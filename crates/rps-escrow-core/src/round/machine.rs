//! Round state machine and the escrow contract that drives it.
//!
//! Every operation follows the same shape:
//!
//! 1. look the round up and run all guards against a staged copy,
//! 2. move tokens inside one ledger transaction,
//! 3. only then write the staged round back and emit events.
//!
//! A failed guard or transfer therefore leaves both the registry and the token
//! balances exactly as they were.

use super::error::RoundError;
use super::record::{Phase, PlayerSlot, Reveal, Round};
use super::registry::RoundRegistry;
use crate::crypto::{Commitment, Salt};
use crate::games::{judge, Move, Outcome};
use crate::ledger::{LedgerError, TokenLedgerClient};
use crate::protocol::{Address, Amount, RoundEvent, RoundId, Seat};
use tracing::{debug, info, warn};

/// Token movement requested by a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// Pull a stake from a player into escrow
    Escrow { from: Address, amount: Amount },
    /// Push funds out of escrow
    Payout { to: Address, amount: Amount },
}

// === Transitions on a single round ===

impl Round {
    /// Seat a second player and add their stake to the pot.
    pub(crate) fn seat(&mut self, player: Address) -> Result<Seat, RoundError> {
        self.ensure_open()?;
        if self.is_full() {
            return Err(RoundError::RoundFull(self.id));
        }
        if self.seat_of(&player).is_some() {
            return Err(RoundError::AlreadyParticipant {
                round_id: self.id,
                player,
            });
        }

        self.pot = self
            .pot
            .checked_add(self.wager)
            .ok_or(RoundError::PotOverflow(self.id))?;
        self.players.push(PlayerSlot::new(player));
        self.phase = Phase::Joined;
        Ok(Seat::Second)
    }

    pub(crate) fn commit(&mut self, player: Address, commitment: Commitment) -> Result<Seat, RoundError> {
        self.ensure_open()?;
        let seat = self.participant(player)?;
        if !self.is_full() {
            return Err(RoundError::AwaitingOpponent(self.id));
        }

        let slot = &mut self.players[seat.index()];
        if slot.commitment.is_some() {
            return Err(RoundError::AlreadyCommitted {
                round_id: self.id,
                player,
            });
        }
        slot.commitment = Some(commitment);

        let opponent = self.player(seat.opponent()).and_then(|p| p.commitment);
        if opponent == Some(commitment) {
            // A copied commitment can at best force a tie once the first reveal is public
            debug!("{} repeated the opponent's commitment in round {}", player, self.id);
        }

        if self.both_committed() {
            self.phase = Phase::Committed;
        }
        Ok(seat)
    }

    pub(crate) fn reveal(&mut self, player: Address, mv: Move, salt: Salt) -> Result<Seat, RoundError> {
        self.ensure_open()?;
        let seat = self.participant(player)?;
        if !self.both_committed() {
            return Err(RoundError::CommitmentsPending(self.id));
        }

        let round_id = self.id;
        let slot = &mut self.players[seat.index()];
        if slot.reveal.is_some() {
            return Err(RoundError::AlreadyRevealed { round_id, player });
        }
        let opens = slot
            .commitment
            .as_ref()
            .is_some_and(|commitment| commitment.verify(mv, &salt));
        if !opens {
            return Err(RoundError::CommitmentMismatch { round_id, player });
        }
        slot.reveal = Some(Reveal { mv, salt });

        self.phase = Phase::Revealed;
        Ok(seat)
    }

    /// Judge both reveals and mark the round resolved. Returns the payouts owed.
    pub(crate) fn resolve(&mut self) -> Result<(Outcome, Vec<Transfer>), RoundError> {
        self.ensure_open()?;
        let (first, second) = match (self.revealed_move(Seat::First), self.revealed_move(Seat::Second)) {
            (Some(first), Some(second)) => (first, second),
            _ => return Err(RoundError::CommitmentsPending(self.id)),
        };

        let outcome = judge(first, second);
        let payouts = match outcome {
            Outcome::Player1Wins => vec![Transfer::Payout {
                to: self.players[Seat::First.index()].address,
                amount: self.pot,
            }],
            Outcome::Player2Wins => vec![Transfer::Payout {
                to: self.players[Seat::Second.index()].address,
                amount: self.pot,
            }],
            // Exact refunds, never a split pot
            Outcome::Tie => self
                .players
                .iter()
                .map(|slot| Transfer::Payout {
                    to: slot.address,
                    amount: self.wager,
                })
                .collect(),
        };

        self.outcome = Some(outcome);
        self.paid_out = payouts
            .iter()
            .map(|t| match t {
                Transfer::Payout { amount, .. } | Transfer::Escrow { amount, .. } => *amount,
            })
            .sum();
        self.phase = Phase::Resolved;
        Ok((outcome, payouts))
    }

    fn revealed_move(&self, seat: Seat) -> Option<Move> {
        self.player(seat)
            .and_then(|slot| slot.reveal.as_ref())
            .map(|reveal| reveal.mv)
    }

    fn ensure_open(&self) -> Result<(), RoundError> {
        if self.is_resolved() {
            return Err(RoundError::RoundAlreadyResolved(self.id));
        }
        Ok(())
    }

    fn participant(&self, player: Address) -> Result<Seat, RoundError> {
        self.seat_of(&player).ok_or(RoundError::NotAParticipant {
            round_id: self.id,
            player,
        })
    }
}

// === Contract ===

/// The escrow contract: one token, many rounds.
pub struct RockPaperScissors<L> {
    token: Address,
    escrow: Address,
    ledger: L,
    registry: RoundRegistry,
    events: Vec<RoundEvent>,
}

impl<L: TokenLedgerClient> RockPaperScissors<L> {
    /// Deploy a contract wagering in `token`, holding stakes at `escrow`.
    /// Both are fixed for the lifetime of the contract.
    pub fn deploy(token: Address, escrow: Address, ledger: L) -> Self {
        info!("Deployed RPS escrow {} for token {}", escrow, token);
        Self {
            token,
            escrow,
            ledger,
            registry: RoundRegistry::new(),
            events: Vec::new(),
        }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn registry(&self) -> &RoundRegistry {
        &self.registry
    }

    pub fn lookup(&self, round_id: RoundId) -> Result<&Round, RoundError> {
        self.registry.lookup(round_id)
    }

    /// Every event emitted so far, oldest first
    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    /// Open a round: the creator takes the first seat and posts `wager`.
    pub fn create(&mut self, round_id: RoundId, wager: Amount, creator: Address) -> Result<(), RoundError> {
        self.registry.ensure_vacant(round_id)?;
        self.ensure_not_escrow(round_id, creator)?;
        let round = Round::open(round_id, wager, creator);

        self.settle(
            round_id,
            &[Transfer::Escrow {
                from: creator,
                amount: wager,
            }],
        )?;
        self.registry.insert(round)?;

        info!("Created round {} with wager {} by {}", round_id, wager, creator);
        self.events.push(RoundEvent::RoundCreated { round_id, wager });
        self.events.push(RoundEvent::PlayerJoined {
            round_id,
            player: creator,
        });
        Ok(())
    }

    /// Take the second seat, posting the round's wager.
    pub fn join(&mut self, round_id: RoundId, player: Address) -> Result<(), RoundError> {
        let mut round = self.registry.lookup(round_id)?.clone();
        round.seat(player).inspect_err(|e| debug!("Join rejected: {}", e))?;
        self.ensure_not_escrow(round_id, player)?;

        self.settle(
            round_id,
            &[Transfer::Escrow {
                from: player,
                amount: round.wager,
            }],
        )?;
        self.registry.store(round)?;

        info!("Player {} joined round {}", player, round_id);
        self.events.push(RoundEvent::PlayerJoined { round_id, player });
        Ok(())
    }

    pub fn submit_commitment(
        &mut self,
        round_id: RoundId,
        player: Address,
        commitment: Commitment,
    ) -> Result<(), RoundError> {
        let mut round = self.registry.lookup(round_id)?.clone();
        let seat = round
            .commit(player, commitment)
            .inspect_err(|e| debug!("Commitment rejected: {}", e))?;
        let phase = round.phase;
        self.registry.store(round)?;

        info!("{} ({}) committed in round {}, phase {:?}", player, seat, round_id, phase);
        self.events.push(RoundEvent::MoveCommitted { round_id, player });
        Ok(())
    }

    /// Open a commitment. The second reveal resolves the round and pays out
    /// in the same call; its outcome is returned.
    pub fn reveal(
        &mut self,
        round_id: RoundId,
        player: Address,
        mv: Move,
        salt: Salt,
    ) -> Result<Option<Outcome>, RoundError> {
        let mut round = self.registry.lookup(round_id)?.clone();
        let seat = round
            .reveal(player, mv, salt)
            .inspect_err(|e| debug!("Reveal rejected: {}", e))?;

        if !round.both_revealed() {
            self.registry.store(round)?;
            info!("{} ({}) revealed in round {}", player, seat, round_id);
            self.events.push(RoundEvent::MoveRevealed { round_id, player, mv });
            return Ok(None);
        }

        let (outcome, payouts) = round.resolve()?;
        self.settle(round_id, &payouts)?;
        let winner = round.winner();
        self.registry.store(round)?;

        info!("Round {} resolved: {}", round_id, outcome);
        self.events.push(RoundEvent::MoveRevealed { round_id, player, mv });
        self.events.push(RoundEvent::RoundResolved {
            round_id,
            outcome,
            winner,
        });
        for transfer in payouts {
            if let Transfer::Payout { to, amount } = transfer {
                self.events.push(RoundEvent::Payout {
                    round_id,
                    recipient: to,
                    amount,
                });
            }
        }
        Ok(Some(outcome))
    }

    /// Drop a resolved round's record; its id can never be reused.
    pub fn archive(&mut self, round_id: RoundId) -> Result<Round, RoundError> {
        let round = self.registry.archive(round_id)?;
        info!("Archived round {}", round_id);
        Ok(round)
    }

    /// Tokens the escrow account currently holds according to the ledger
    pub fn escrow_balance(&self) -> Result<Amount, LedgerError> {
        self.ledger.balance_of(&self.escrow)
    }

    /// The escrow account never holds a seat
    fn ensure_not_escrow(&self, round_id: RoundId, player: Address) -> Result<(), RoundError> {
        if player == self.escrow {
            debug!("Rejected escrow account as player in round {}", round_id);
            return Err(RoundError::EscrowCannotPlay { round_id, player });
        }
        Ok(())
    }

    /// Run `transfers` as one ledger transaction: all land or none do.
    fn settle(&self, round_id: RoundId, transfers: &[Transfer]) -> Result<(), RoundError> {
        self.ledger.begin();
        for transfer in transfers {
            if let Err(err) = self.execute(round_id, transfer) {
                self.ledger.rollback();
                warn!("Rolled back transfers for round {}: {}", round_id, err);
                return Err(err);
            }
        }
        self.ledger.commit();
        Ok(())
    }

    fn execute(&self, round_id: RoundId, transfer: &Transfer) -> Result<(), RoundError> {
        let (account, amount) = match *transfer {
            Transfer::Escrow { from, amount } => (from, amount),
            Transfer::Payout { to, amount } => (to, amount),
        };
        let failed = |reason: String| RoundError::TokenTransferFailed {
            round_id,
            account,
            amount,
            reason,
        };

        let moved = match *transfer {
            Transfer::Escrow { from, amount } => {
                let balance = self.ledger.balance_of(&from).map_err(|e| failed(e.to_string()))?;
                if balance < amount {
                    return Err(failed(format!("balance {} is below the wager", balance)));
                }
                self.ledger.transfer_from(&from, &self.escrow, amount)
            }
            Transfer::Payout { to, amount } => self.ledger.transfer(&to, amount),
        };

        match moved {
            Ok(true) => Ok(()),
            Ok(false) => Err(failed("ledger rejected the transfer".to_string())),
            Err(e) => Err(failed(e.to_string())),
        }
    }
}
