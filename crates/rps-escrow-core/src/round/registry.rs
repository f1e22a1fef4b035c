//! Round storage.

use super::error::RoundError;
use super::record::Round;
use crate::protocol::{Amount, RoundId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Owns every round record. Archived ids stay reserved forever.
#[derive(Clone, Debug, Default)]
pub struct RoundRegistry {
    rounds: BTreeMap<RoundId, Round>,
    archived: BTreeSet<RoundId>,
}

impl RoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has ever been used, including archived rounds
    pub fn is_taken(&self, id: RoundId) -> bool {
        self.rounds.contains_key(&id) || self.archived.contains(&id)
    }

    /// Fail with `RoundAlreadyExists` if `id` has ever been used
    pub fn ensure_vacant(&self, id: RoundId) -> Result<(), RoundError> {
        if self.is_taken(id) {
            debug!("Rejected round {} - id already taken", id);
            return Err(RoundError::RoundAlreadyExists(id));
        }
        Ok(())
    }

    pub fn lookup(&self, id: RoundId) -> Result<&Round, RoundError> {
        self.rounds.get(&id).ok_or(RoundError::RoundDoesNotExist(id))
    }

    /// Insert a new round; never overwrites
    pub(crate) fn insert(&mut self, round: Round) -> Result<(), RoundError> {
        self.ensure_vacant(round.id)?;
        self.rounds.insert(round.id, round);
        Ok(())
    }

    /// Write back a staged copy of an existing round
    pub(crate) fn store(&mut self, round: Round) -> Result<(), RoundError> {
        match self.rounds.get_mut(&round.id) {
            Some(slot) => {
                *slot = round;
                Ok(())
            }
            None => Err(RoundError::RoundDoesNotExist(round.id)),
        }
    }

    /// Drop a resolved round's record while keeping its id reserved
    pub fn archive(&mut self, id: RoundId) -> Result<Round, RoundError> {
        let round = self.lookup(id)?;
        if !round.is_resolved() {
            return Err(RoundError::RoundNotResolved(id));
        }
        self.archived.insert(id);
        self.rounds
            .remove(&id)
            .ok_or(RoundError::RoundDoesNotExist(id))
    }

    pub fn is_archived(&self, id: RoundId) -> bool {
        self.archived.contains(&id)
    }

    /// Sum of the pots of every unresolved round
    pub fn escrowed_total(&self) -> Amount {
        self.rounds.values().map(Round::escrowed).sum()
    }

    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
