//! Protocol types and events.

mod events;
mod types;

pub use events::RoundEvent;
pub use types::{Address, AddressError, Amount, RoundId, Seat};
