// chbridge-core/src/domain/workflow/flight.rs

use std::collections::HashMap;

use crate::domain::workflow::state::Action;

pub type Generation = u64;

/// Tag carried by an outstanding request: which action, issued in which generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub action: Action,
    pub generation: Generation,
}

/// Registry of outstanding requests, at most one per action.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    outstanding: HashMap<Action, Generation>,
}

impl InFlight {
    pub fn is_outstanding(&self, action: Action, generation: Generation) -> bool {
        self.outstanding.get(&action) == Some(&generation)
    }

    /// Registers a request. Returns None when the same action is already
    /// outstanding in this generation. An entry from an older generation is
    /// replaced: its response will be stale anyway.
    pub fn begin(&mut self, action: Action, generation: Generation) -> Option<Ticket> {
        if self.is_outstanding(action, generation) {
            return None;
        }
        self.outstanding.insert(action, generation);
        Some(Ticket { action, generation })
    }

    /// Releases the slot held by `ticket`. Returns false when a newer request
    /// already owns the slot.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        if self.is_outstanding(ticket.action, ticket.generation) {
            self.outstanding.remove(&ticket.action);
            true
        } else {
            false
        }
    }

    /// Some other action still outstanding in `generation`. Network requests of
    /// one workflow never overlap, so a different action has to wait for it.
    pub fn busy_with(&self, action: Action, generation: Generation) -> Option<Action> {
        self.outstanding
            .iter()
            .find(|(other, issued)| **other != action && **issued == generation)
            .map(|(other, _)| *other)
    }
}
