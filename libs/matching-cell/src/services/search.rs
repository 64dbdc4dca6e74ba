// libs/matching-cell/src/services/search.rs
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    AcceptResponse, AppointmentSlot, CommitOutcome, MatchSession, MatchingError, SearchResponse,
    SessionEvent, SessionView, StartSearchRequest,
};
use crate::services::committer::{BookingCommitter, HttpBookingCommitter};
use crate::services::events::{LoggingEventSink, SessionEventSink};
use crate::services::matcher::SlotMatcherService;
use crate::services::pool::{HttpSlotProvider, SlotProvider};
use crate::services::scoring::UrgencyScoringService;
use crate::services::session::{SessionEntry, SessionStore};

/// Orchestrates one patient's open search end to end: scoring the
/// intake, proposing slots from the live pool, and driving the session
/// state machine through accept/reject/cancel. The slot store and the
/// booking committer stay behind trait seams; everything here is
/// in-memory apart from their calls.
pub struct OpenSearchService {
    scoring: UrgencyScoringService,
    matcher: SlotMatcherService,
    store: SessionStore,
    slot_provider: Arc<dyn SlotProvider>,
    committer: Arc<dyn BookingCommitter>,
    event_sink: Arc<dyn SessionEventSink>,
}

impl OpenSearchService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_collaborators(
            Arc::new(HttpSlotProvider::new(config)),
            Arc::new(HttpBookingCommitter::new(config)),
            Arc::new(LoggingEventSink),
        )
    }

    pub fn with_collaborators(
        slot_provider: Arc<dyn SlotProvider>,
        committer: Arc<dyn BookingCommitter>,
        event_sink: Arc<dyn SessionEventSink>,
    ) -> Self {
        Self {
            scoring: UrgencyScoringService::new(),
            matcher: SlotMatcherService::new(),
            store: SessionStore::new(),
            slot_provider,
            committer,
            event_sink,
        }
    }

    /// Scores the intake, opens a session, and proposes the first slot.
    /// A pool with no acceptable candidate exhausts the search
    /// immediately.
    pub async fn start_search(
        &self,
        request: StartSearchRequest,
    ) -> Result<SearchResponse, MatchingError> {
        let assessment = self.scoring.score(&request.intake)?;

        let mut session = MatchSession::new(assessment, request.intake.max_travel_distance_km);
        info!(
            "Started open search {} for patient {} (score {}, tier {})",
            session.session_id, request.patient_id, assessment.score, assessment.tier
        );

        let pool = self.slot_provider.fetch_open_slots(&request.criteria).await?;
        let proposal = self.matcher.propose_next(&mut session, &pool)?;

        if proposal.is_none() {
            self.event_sink.on_event(SessionEvent::Exhausted {
                session_id: session.session_id,
            });
        }

        let response = SearchResponse {
            session_id: session.session_id,
            assessment,
            state: session.state,
            proposal,
        };

        // Exhausted searches are terminal and never enter the registry.
        if !session.state.is_terminal() {
            self.store.insert(session, request.criteria).await;
        }

        Ok(response)
    }

    /// Re-runs the matcher against a fresh pool snapshot.
    pub async fn next_proposal(&self, session_id: Uuid) -> Result<SearchResponse, MatchingError> {
        let entry = self.store.get(session_id).await?;

        let (response, terminal) = {
            let mut guard = entry.lock().await;
            let proposal = self.propose_for_entry(&mut guard).await?;

            let response = SearchResponse {
                session_id,
                assessment: guard.session.assessment,
                state: guard.session.state,
                proposal,
            };
            (response, guard.session.state.is_terminal())
        };

        if terminal {
            self.store.remove(session_id).await;
        }

        Ok(response)
    }

    /// Patient turned the proposal down: exclude it and offer the next
    /// best candidate in one step.
    pub async fn reject(&self, session_id: Uuid) -> Result<SearchResponse, MatchingError> {
        let entry = self.store.get(session_id).await?;

        let (response, terminal) = {
            let mut guard = entry.lock().await;
            guard.session.reject()?;

            let proposal = self.propose_for_entry(&mut guard).await?;
            let response = SearchResponse {
                session_id,
                assessment: guard.session.assessment,
                state: guard.session.state,
                proposal,
            };
            (response, guard.session.state.is_terminal())
        };

        if terminal {
            self.store.remove(session_id).await;
        }

        Ok(response)
    }

    /// Patient approved the proposal: commit it with the external
    /// booking committer. A lost race is recovered like a rejection and
    /// the next candidate is proposed in the same call.
    pub async fn accept(&self, session_id: Uuid) -> Result<AcceptResponse, MatchingError> {
        let entry = self.store.get(session_id).await?;

        let (response, terminal) = {
            let mut guard = entry.lock().await;
            let slot = guard.session.accept()?;

            let outcome = match self.committer.commit(slot.id, session_id).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // The commit never reached the store; reopen the
                    // proposal so the caller can retry the accept.
                    guard.session.rollback_accept()?;
                    return Err(err);
                }
            };

            match outcome {
                CommitOutcome::Confirmed(booking) => {
                    self.event_sink.on_event(SessionEvent::Accepted {
                        session_id,
                        booking: booking.clone(),
                    });

                    let response = AcceptResponse {
                        session_id,
                        state: guard.session.state,
                        booking: Some(booking),
                        proposal: None,
                    };
                    (response, true)
                }
                CommitOutcome::Failed { reason } => {
                    info!(
                        "Commit failed for session {} ({}), resuming search",
                        session_id, reason
                    );
                    guard.session.recover_from_commit_failure()?;

                    let proposal = self.propose_for_entry(&mut guard).await?;
                    let response = AcceptResponse {
                        session_id,
                        state: guard.session.state,
                        booking: None,
                        proposal,
                    };
                    (response, guard.session.state.is_terminal())
                }
            }
        };

        if terminal {
            self.store.remove(session_id).await;
        }

        Ok(response)
    }

    pub async fn cancel(&self, session_id: Uuid) -> Result<SessionView, MatchingError> {
        let entry = self.store.get(session_id).await?;

        let view = {
            let mut guard = entry.lock().await;
            guard.session.cancel()?;
            SessionView::from(&guard.session)
        };

        self.store.remove(session_id).await;
        Ok(view)
    }

    pub async fn expire(&self, session_id: Uuid) -> Result<SessionView, MatchingError> {
        let entry = self.store.get(session_id).await?;

        let view = {
            let mut guard = entry.lock().await;
            guard.session.expire()?;
            SessionView::from(&guard.session)
        };

        self.store.remove(session_id).await;
        Ok(view)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionView, MatchingError> {
        let entry = self.store.get(session_id).await?;
        let guard = entry.lock().await;
        Ok(SessionView::from(&guard.session))
    }

    /// Drops sessions idle past the ttl. Intended for a periodic host
    /// task.
    pub async fn sweep_expired(&self, ttl_minutes: i64) -> usize {
        self.store.sweep_expired(ttl_minutes).await
    }

    async fn propose_for_entry(
        &self,
        entry: &mut SessionEntry,
    ) -> Result<Option<AppointmentSlot>, MatchingError> {
        let pool = self.slot_provider.fetch_open_slots(&entry.criteria).await?;
        let proposal = self.matcher.propose_next(&mut entry.session, &pool)?;

        if proposal.is_none() {
            self.event_sink.on_event(SessionEvent::Exhausted {
                session_id: entry.session.session_id,
            });
        }

        Ok(proposal)
    }
}
