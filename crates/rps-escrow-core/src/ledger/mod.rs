//! Token ledger client abstraction.

mod mock;
mod traits;

pub use mock::MockTokenLedger;
pub use traits::{LedgerError, TokenLedgerClient};
