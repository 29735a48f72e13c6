//! Realtime wire messages and the client-side active list they update.
//!
//! Every frame the server pushes is a JSON object `{"event": ..., "data": ...}`
//! decoded into a [`ServerMessage`]. Clients keep an [`ActiveAccidents`]
//! list and merge each accident message into it by id.

use serde::{Deserialize, Serialize};

use crate::accident::Accident;
use crate::types::DbId;

/// Message pushed from the server over the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A freshly detected accident.
    NewAccident(Accident),
    /// Any change to an existing accident (status, assignee, details).
    AccidentUpdate(Accident),
    /// The session was superseded by a newer login; the server closes the
    /// socket right after sending this.
    ForceLogout { message: String },
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::NewAccident(_) => "new_accident",
            ServerMessage::AccidentUpdate(_) => "accident_update",
            ServerMessage::ForceLogout { .. } => "force_logout",
        }
    }

    /// The accident carried by this message, if any.
    pub fn accident(&self) -> Option<&Accident> {
        match self {
            ServerMessage::NewAccident(a) | ServerMessage::AccidentUpdate(a) => Some(a),
            ServerMessage::ForceLogout { .. } => None,
        }
    }
}

/// Outcome of merging one message into an [`ActiveAccidents`] list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Removed,
    /// Nothing changed (handled accident not in the list, or no accident).
    Unchanged,
}

/// The dashboard's list of open accidents, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveAccidents {
    items: Vec<Accident>,
}

impl ActiveAccidents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a REST listing; handled records are dropped.
    pub fn from_list(list: Vec<Accident>) -> Self {
        let mut active = Self::new();
        active.replace_all(list);
        active
    }

    /// Replace the whole list, e.g. after a reconnect refetch.
    pub fn replace_all(&mut self, list: Vec<Accident>) {
        self.items = list.into_iter().filter(|a| a.status.is_open()).collect();
    }

    /// Merge one message by accident id.
    ///
    /// A handled accident is removed. An open accident replaces the record
    /// with the same id in place, or is inserted at the front.
    pub fn apply(&mut self, message: &ServerMessage) -> MergeOutcome {
        let Some(accident) = message.accident() else {
            return MergeOutcome::Unchanged;
        };
        let position = self.position(accident.id);

        match (accident.status.is_open(), position) {
            (false, Some(idx)) => {
                self.items.remove(idx);
                MergeOutcome::Removed
            }
            (false, None) => MergeOutcome::Unchanged,
            (true, Some(idx)) => {
                self.items[idx] = accident.clone();
                MergeOutcome::Replaced
            }
            (true, None) => {
                self.items.insert(0, accident.clone());
                MergeOutcome::Inserted
            }
        }
    }

    pub fn get(&self, id: DbId) -> Option<&Accident> {
        self.position(id).map(|idx| &self.items[idx])
    }

    pub fn as_slice(&self) -> &[Accident] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: DbId) -> Option<usize> {
        self.items.iter().position(|a| a.id == id)
    }
}
