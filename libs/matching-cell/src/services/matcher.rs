// libs/matching-cell/src/services/matcher.rs
use std::cmp::Ordering;

use tracing::{debug, info};

use crate::models::{AppointmentSlot, MatchSession, MatchSessionState, MatchingError};

/// Selects the single best open slot for a session using the
/// tier-dependent ranking policy: urgent tiers take the earliest opening
/// regardless of distance, the rest take the closest acceptable one.
pub struct SlotMatcherService;

impl SlotMatcherService {
    pub fn new() -> Self {
        Self
    }

    /// Proposes the best remaining candidate and moves the session to
    /// `Proposed`. Returns `Ok(None)` and moves the session to
    /// `Exhausted` when no candidate survives the filters; exhaustion is
    /// a normal outcome, not an error. Never touches the exclusion set.
    pub fn propose_next(
        &self,
        session: &mut MatchSession,
        pool: &[AppointmentSlot],
    ) -> Result<Option<AppointmentSlot>, MatchingError> {
        if session.state != MatchSessionState::Searching {
            return Err(MatchingError::InvalidStateTransition(session.state));
        }

        let mut candidates: Vec<&AppointmentSlot> = pool
            .iter()
            .filter(|slot| !session.excluded_slot_ids.contains(&slot.id))
            .filter(|slot| match session.max_travel_distance_km {
                Some(limit) => slot.distance_km <= limit,
                None => true,
            })
            .collect();

        if session.assessment.tier.prioritizes_earliest() {
            candidates.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        } else {
            candidates.sort_by(|a, b| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(Ordering::Equal)
                    .then(a.start_time.cmp(&b.start_time))
                    .then(a.id.cmp(&b.id))
            });
        }

        match candidates.first() {
            Some(best) => {
                let slot = (*best).clone();
                debug!(
                    "Proposing slot {} (start {}, {:.1} km) for session {}",
                    slot.id, slot.start_time, slot.distance_km, session.session_id
                );

                session.current_proposal = Some(slot.clone());
                session.state = MatchSessionState::Proposed;
                session.updated_at = chrono::Utc::now();

                Ok(Some(slot))
            }
            None => {
                info!(
                    "No candidates left for session {} ({} excluded)",
                    session.session_id,
                    session.excluded_slot_ids.len()
                );

                session.current_proposal = None;
                session.state = MatchSessionState::Exhausted;
                session.updated_at = chrono::Utc::now();

                Ok(None)
            }
        }
    }
}

impl Default for SlotMatcherService {
    fn default() -> Self {
        Self::new()
    }
}
