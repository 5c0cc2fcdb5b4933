//! Bounded per-session conversation memory.
//!
//! Each session id maps to an ordered history of turns, capped at a fixed
//! count with FIFO eviction. The store also reports whether a session id
//! has been seen before, which drives the one-time welcome reply.
//!
//! Histories condition the tone of generated replies. They are never
//! treated as grounding evidence, so losing old turns to eviction only
//! affects continuity, not correctness.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use crate::models::Turn;

/// Thread-safe store of bounded session histories.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, VecDeque<Turn>>>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Record that a session id was seen. Returns `true` the first time,
    /// `false` on every later call.
    pub fn observe(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.entry(session_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(VecDeque::new());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Append a turn, evicting the oldest turns beyond the cap.
    pub fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.sessions.write().unwrap();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push_back(turn);
        while history.len() > self.max_turns {
            history.pop_front();
        }
    }

    /// The current ordered history for a session, empty if unseen.
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(session_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}
