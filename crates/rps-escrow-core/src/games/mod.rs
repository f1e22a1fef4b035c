//! Game definitions and logic.

mod rps;

pub use rps::{judge, Move, Outcome, UnknownMove};
