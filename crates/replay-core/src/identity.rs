//! Participant identity recovery.
//!
//! Raw participant keys in the log are opaque strings. Analysis wants small
//! stable indices. `Trial.WorkspaceInitialized` events are authoritative;
//! older logs lack them, but `Trial.DamageTakenChanged` events iterated the
//! workspaces left-to-right, so the order of first appearance in damage
//! events recovers the index for those logs.

use std::collections::HashMap;

/// Maps raw participant keys to stable small-integer indices.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    ids: HashMap<String, i64>,
    heuristic_counter: i64,
    authoritative_counter: i64,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            heuristic_counter: -1,
            authoritative_counter: -1,
        }
    }

    /// Record an authoritative workspace-initialized assignment. Overrides
    /// any earlier heuristic assignment for the key; authoritative indices
    /// count up from zero in initialization order.
    pub fn observe_initialized(&mut self, participant: &str) -> i64 {
        self.authoritative_counter += 1;
        self.ids
            .insert(participant.to_string(), self.authoritative_counter);
        self.authoritative_counter
    }

    /// Record a damage event. The first damage event for an unseen key
    /// assigns the next heuristic index and returns it; keys that are
    /// already registered return `None`.
    pub fn observe_damage(&mut self, participant: &str) -> Option<i64> {
        if self.ids.contains_key(participant) {
            return None;
        }
        self.heuristic_counter += 1;
        self.ids
            .insert(participant.to_string(), self.heuristic_counter);
        Some(self.heuristic_counter)
    }

    /// The stable index for a raw key, if one has been assigned.
    pub fn lookup(&self, participant: &str) -> Option<i64> {
        self.ids.get(participant).copied()
    }

    /// The stable index for a raw key, or -1 for unknown keys (the value
    /// uncoded touches report).
    pub fn lookup_or_unknown(&self, participant: &str) -> i64 {
        self.lookup(participant).unwrap_or(-1)
    }
}
