//! Round lifecycle: records, storage and the escrow contract.

mod error;
mod machine;
mod record;
mod registry;

pub use error::RoundError;
pub use machine::{RockPaperScissors, Transfer};
pub use record::{Phase, PlayerSlot, Reveal, Round};
pub use registry::RoundRegistry;
