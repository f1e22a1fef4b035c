//! RPS Escrow Core Library
//!
//! Rock-paper-scissors wagers settled by an escrow contract over an ERC20-style
//! token. This crate provides the commit-reveal primitives, the resolution rule,
//! the token ledger client abstraction and the round state machine.

pub mod crypto;
pub mod games;
pub mod ledger;
pub mod protocol;
pub mod round;

pub use crypto::{Commitment, Salt};
pub use games::{judge, Move, Outcome};
pub use ledger::{LedgerError, MockTokenLedger, TokenLedgerClient};
pub use protocol::{Address, Amount, RoundEvent, RoundId, Seat};
pub use round::{Phase, RockPaperScissors, Round, RoundError, RoundRegistry};
