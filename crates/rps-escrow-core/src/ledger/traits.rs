//! Token ledger client trait definition.

use crate::protocol::{Address, Amount};
use thiserror::Error;

/// Errors from token ledger operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: {account} holds {available}, needs {required}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Insufficient allowance: {owner} approved {approved}, needs {required}")]
    InsufficientAllowance {
        owner: Address,
        approved: Amount,
        required: Amount,
    },

    #[error("Account frozen: {0}")]
    AccountFrozen(Address),

    #[error("Balance overflow for {0}")]
    Overflow(Address),

    #[error("Call reverted: {0}")]
    Reverted(String),
}

/// Client for the ERC20-style token the escrow wagers in.
///
/// Every call acts on behalf of the escrow contract: `transfer_from` spends the
/// allowance an owner granted the escrow, and `transfer` pays out of the
/// escrow's own balance. `Ok(false)` and `Err(_)` both mean the call did not
/// move funds and the enclosing operation must abort.
pub trait TokenLedgerClient: Send + Sync {
    /// Token balance held by `account`
    fn balance_of(&self, account: &Address) -> Result<Amount, LedgerError>;

    /// Move `amount` from `owner` to `recipient` using the owner's allowance
    fn transfer_from(
        &self,
        owner: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<bool, LedgerError>;

    /// Move `amount` from the escrow to `to`
    fn transfer(&self, to: &Address, amount: Amount) -> Result<bool, LedgerError>;

    /// Open a ledger transaction. Hosts that already revert a failed call
    /// wholesale keep the no-op default.
    fn begin(&self) {}

    /// Make every transfer since `begin` permanent
    fn commit(&self) {}

    /// Undo every transfer since `begin`
    fn rollback(&self) {}
}

impl<T: TokenLedgerClient + ?Sized> TokenLedgerClient for std::sync::Arc<T> {
    fn balance_of(&self, account: &Address) -> Result<Amount, LedgerError> {
        (**self).balance_of(account)
    }

    fn transfer_from(
        &self,
        owner: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<bool, LedgerError> {
        (**self).transfer_from(owner, recipient, amount)
    }

    fn transfer(&self, to: &Address, amount: Amount) -> Result<bool, LedgerError> {
        (**self).transfer(to, amount)
    }

    fn begin(&self) {
        (**self).begin()
    }

    fn commit(&self) {
        (**self).commit()
    }

    fn rollback(&self) {
        (**self).rollback()
    }
}
