// libs/matching-cell/src/services/session.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    AppointmentSlot, MatchSession, MatchSessionState, MatchingError, SlotFilterCriteria,
};

// ==============================================================================
// STATE TRANSITIONS
// ==============================================================================

impl MatchSession {
    /// Accept the current proposal. Valid only while `Proposed`; returns
    /// the slot to hand to the booking committer.
    pub fn accept(&mut self) -> Result<AppointmentSlot, MatchingError> {
        if self.state != MatchSessionState::Proposed {
            return Err(MatchingError::InvalidStateTransition(self.state));
        }

        // Invariant: Proposed always carries a proposal.
        let slot = self
            .current_proposal
            .clone()
            .ok_or_else(|| MatchingError::InvalidStateTransition(self.state))?;

        self.state = MatchSessionState::Accepted;
        self.updated_at = Utc::now();

        debug!("Session {} accepted slot {}", self.session_id, slot.id);
        Ok(slot)
    }

    /// Reject the current proposal: the slot joins the exclusion set and
    /// is never re-offered within this session.
    pub fn reject(&mut self) -> Result<Uuid, MatchingError> {
        if self.state != MatchSessionState::Proposed {
            return Err(MatchingError::InvalidStateTransition(self.state));
        }

        let slot = self
            .current_proposal
            .take()
            .ok_or_else(|| MatchingError::InvalidStateTransition(self.state))?;

        self.excluded_slot_ids.insert(slot.id);
        self.state = MatchSessionState::Searching;
        self.updated_at = Utc::now();

        debug!("Session {} rejected slot {}", self.session_id, slot.id);
        Ok(slot.id)
    }

    /// Undo an accept whose commit never reached the slot store. The
    /// proposal stays current and can be accepted again; exclusions are
    /// untouched because the slot was never contested.
    pub fn rollback_accept(&mut self) -> Result<(), MatchingError> {
        if self.state != MatchSessionState::Accepted {
            return Err(MatchingError::InvalidStateTransition(self.state));
        }

        self.state = MatchSessionState::Proposed;
        self.updated_at = Utc::now();

        debug!("Session {} rolled back to proposed", self.session_id);
        Ok(())
    }

    /// Explicit patient cancellation. Not idempotent: calling it from a
    /// terminal state is an error.
    pub fn cancel(&mut self) -> Result<(), MatchingError> {
        if !matches!(
            self.state,
            MatchSessionState::Searching | MatchSessionState::Proposed
        ) {
            return Err(MatchingError::InvalidStateTransition(self.state));
        }

        self.current_proposal = None;
        self.state = MatchSessionState::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Caller-driven timeout enforcement; same transition rules as
    /// `cancel`.
    pub fn expire(&mut self) -> Result<(), MatchingError> {
        self.cancel()
    }

    /// Roll back a lost commit race: the slot could no longer be booked,
    /// so it is treated like a patient rejection and the search resumes.
    pub fn recover_from_commit_failure(&mut self) -> Result<Uuid, MatchingError> {
        if self.state != MatchSessionState::Accepted {
            return Err(MatchingError::InvalidStateTransition(self.state));
        }

        let slot = self
            .current_proposal
            .take()
            .ok_or_else(|| MatchingError::InvalidStateTransition(self.state))?;

        self.excluded_slot_ids.insert(slot.id);
        self.state = MatchSessionState::Searching;
        self.updated_at = Utc::now();

        warn!(
            "Session {} lost the race for slot {}, resuming search",
            self.session_id, slot.id
        );
        Ok(slot.id)
    }

    /// Operations legal in the current state.
    pub fn valid_operations(&self) -> Vec<&'static str> {
        match self.state {
            MatchSessionState::Searching => vec!["propose_next", "cancel", "expire"],
            MatchSessionState::Proposed => vec!["accept", "reject", "cancel", "expire"],
            // Terminal states - no operations allowed
            MatchSessionState::Accepted
            | MatchSessionState::Exhausted
            | MatchSessionState::Cancelled => vec![],
        }
    }
}

// ==============================================================================
// SESSION STORE
// ==============================================================================

/// A live search plus the slot store filter it was started with.
#[derive(Debug)]
pub struct SessionEntry {
    pub session: MatchSession,
    pub criteria: SlotFilterCriteria,
}

/// In-memory registry of live searches. Each entry carries its own lock:
/// a session belongs to exactly one patient's flow and never shares
/// mutable state with another session. The outer lock only guards the
/// map itself.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, Arc<Mutex<SessionEntry>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: MatchSession, criteria: SlotFilterCriteria) {
        let session_id = session.session_id;
        let entry = Arc::new(Mutex::new(SessionEntry { session, criteria }));
        self.inner.write().await.insert(session_id, entry);
    }

    pub async fn get(&self, session_id: Uuid) -> Result<Arc<Mutex<SessionEntry>>, MatchingError> {
        self.inner
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(MatchingError::SessionNotFound)
    }

    /// Drops a session that reached a terminal state.
    pub async fn remove(&self, session_id: Uuid) {
        self.inner.write().await.remove(&session_id);
    }

    /// Removes sessions idle past the ttl. The host decides when to
    /// sweep; stale sessions are expired in place before removal.
    pub async fn sweep_expired(&self, ttl_minutes: i64) -> usize {
        let cutoff = Utc::now() - Duration::minutes(ttl_minutes);
        let mut stale = Vec::new();

        {
            let map = self.inner.read().await;
            for (id, entry) in map.iter() {
                let mut guard = entry.lock().await;
                if guard.session.updated_at < cutoff {
                    if !guard.session.state.is_terminal() {
                        let _ = guard.session.expire();
                    }
                    stale.push(*id);
                }
            }
        }

        let mut map = self.inner.write().await;
        for id in &stale {
            map.remove(id);
        }

        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
