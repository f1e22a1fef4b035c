//! Application state management.

use crate::config::NodeConfig;
use rps_escrow_core::{MockTokenLedger, RockPaperScissors};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type Contract = RockPaperScissors<MockTokenLedger>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    contract: Arc<Mutex<Contract>>,
}

impl AppState {
    /// Deploy a fresh contract over an empty in-memory ledger
    pub fn new(config: &NodeConfig) -> Self {
        let ledger = MockTokenLedger::new(config.token, config.escrow);
        let contract = RockPaperScissors::deploy(config.token, config.escrow, ledger);
        Self {
            contract: Arc::new(Mutex::new(contract)),
        }
    }

    /// Exclusive access to the contract and its ledger. Token calls go through
    /// this lock too, so every request runs as one transaction.
    pub fn contract(&self) -> MutexGuard<'_, Contract> {
        self.contract.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&NodeConfig::default())
    }
}
