//! In-memory ERC20 ledger for tests and the dev node.

use super::traits::{LedgerError, TokenLedgerClient};
use crate::protocol::{Address, Amount};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Books {
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
}

impl Books {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn move_funds(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*to))?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Reverse one journaled transfer
    fn undo(&mut self, entry: &JournalEntry) {
        if entry.from != entry.to {
            let to = self.balance(&entry.to).saturating_sub(entry.amount);
            let from = self.balance(&entry.from).saturating_add(entry.amount);
            self.balances.insert(entry.to, to);
            self.balances.insert(entry.from, from);
        }
        if let Some(key) = entry.allowance {
            let restored = self.allowance(&key.0, &key.1).saturating_add(entry.amount);
            self.allowances.insert(key, restored);
        }
    }
}

/// A transfer made inside an open transaction
struct JournalEntry {
    from: Address,
    to: Address,
    amount: Amount,
    /// (owner, spender) whose allowance the transfer spent
    allowance: Option<(Address, Address)>,
}

struct LedgerState {
    token: Address,
    /// Account the client acts for: the escrow contract
    operator: Address,
    books: Books,
    /// Transfers since the last `begin`, undone on `rollback`. Mints and
    /// approvals are never journaled and survive a rollback.
    journal: Option<Vec<JournalEntry>>,
    frozen: HashSet<Address>,
    /// Remaining transfers before every further call reports failure
    transfers_until_failure: Option<usize>,
    completed_transfers: usize,
}

impl LedgerState {
    fn check_not_frozen(&self, accounts: &[&Address]) -> Result<(), LedgerError> {
        match accounts.iter().find(|a| self.frozen.contains(**a)) {
            Some(account) => Err(LedgerError::AccountFrozen(**account)),
            None => Ok(()),
        }
    }

    /// Consume one injected failure slot; `false` means refuse the call
    fn take_transfer_slot(&mut self) -> bool {
        match self.transfers_until_failure {
            Some(0) => false,
            Some(remaining) => {
                self.transfers_until_failure = Some(remaining - 1);
                true
            }
            None => true,
        }
    }

    fn record(&mut self, entry: JournalEntry) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }
}

/// In-memory token ledger.
///
/// Cloning yields another handle onto the same books, so a test can keep one
/// handle for minting and assertions while the contract owns another.
#[derive(Clone)]
pub struct MockTokenLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl MockTokenLedger {
    /// Create an empty ledger for `token`, with calls made on behalf of `escrow`
    pub fn new(token: Address, escrow: Address) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LedgerState {
                token,
                operator: escrow,
                books: Books::default(),
                journal: None,
                frozen: HashSet::new(),
                transfers_until_failure: None,
                completed_transfers: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn token(&self) -> Address {
        self.state().token
    }

    pub fn escrow(&self) -> Address {
        self.state().operator
    }

    /// Credit freshly minted tokens to `account`
    pub fn mint(&self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut state = self.state();
        let credited = state
            .books
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*account))?;
        state.books.balances.insert(*account, credited);
        Ok(())
    }

    /// Set the allowance `owner` grants `spender`, replacing any previous value
    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        self.state()
            .books
            .allowances
            .insert((*owner, *spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state().books.allowance(owner, spender)
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.state().books.balance(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.state().books.balances.values().sum()
    }

    /// Make every call touching `account` revert
    pub fn freeze(&self, account: &Address) {
        self.state().frozen.insert(*account);
    }

    pub fn unfreeze(&self, account: &Address) {
        self.state().frozen.remove(account);
    }

    /// Let `n` more transfers succeed, then report failure on every call
    pub fn fail_transfers_after(&self, n: usize) {
        self.state().transfers_until_failure = Some(n);
    }

    pub fn clear_failures(&self) {
        self.state().transfers_until_failure = None;
    }

    /// Number of transfers that moved funds, including rolled back ones
    pub fn completed_transfers(&self) -> usize {
        self.state().completed_transfers
    }
}

impl TokenLedgerClient for MockTokenLedger {
    fn balance_of(&self, account: &Address) -> Result<Amount, LedgerError> {
        Ok(self.balance(account))
    }

    fn transfer_from(
        &self,
        owner: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<bool, LedgerError> {
        let mut state = self.state();
        state.check_not_frozen(&[owner, recipient])?;
        if !state.take_transfer_slot() {
            return Ok(false);
        }

        let spender = state.operator;
        let approved = state.books.allowance(owner, &spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *owner,
                approved,
                required: amount,
            });
        }

        state.books.move_funds(owner, recipient, amount)?;
        state
            .books
            .allowances
            .insert((*owner, spender), approved - amount);
        state.record(JournalEntry {
            from: *owner,
            to: *recipient,
            amount,
            allowance: Some((*owner, spender)),
        });
        state.completed_transfers += 1;
        Ok(true)
    }

    fn transfer(&self, to: &Address, amount: Amount) -> Result<bool, LedgerError> {
        let mut state = self.state();
        let from = state.operator;
        state.check_not_frozen(&[&from, to])?;
        if !state.take_transfer_slot() {
            return Ok(false);
        }

        state.books.move_funds(&from, to, amount)?;
        state.record(JournalEntry {
            from,
            to: *to,
            amount,
            allowance: None,
        });
        state.completed_transfers += 1;
        Ok(true)
    }

    fn begin(&self) {
        self.state().journal = Some(Vec::new());
    }

    fn commit(&self) {
        self.state().journal = None;
    }

    fn rollback(&self) {
        let mut state = self.state();
        if let Some(journal) = state.journal.take() {
            for entry in journal.iter().rev() {
                state.books.undo(entry);
            }
        }
    }
}
