// libs/matching-cell/tests/session_test.rs
use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use matching_cell::models::{
    AppointmentSlot, MatchSession, MatchSessionState, MatchingError, SlotFilterCriteria,
    UrgencyAssessment, UrgencyTier,
};
use matching_cell::services::session::SessionStore;

fn proposal_slot(n: u128) -> AppointmentSlot {
    AppointmentSlot {
        id: Uuid::from_u128(n),
        practice_id: Uuid::from_u128(1000),
        dentist_id: Uuid::from_u128(2000),
        start_time: Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
        duration_minutes: 45,
        distance_km: 3.5,
        treatment_type: "filling".to_string(),
    }
}

fn searching_session() -> MatchSession {
    MatchSession::new(
        UrgencyAssessment {
            score: 15,
            tier: UrgencyTier::High,
        },
        Some(10.0),
    )
}

fn proposed_session(n: u128) -> MatchSession {
    let mut session = searching_session();
    session.current_proposal = Some(proposal_slot(n));
    session.state = MatchSessionState::Proposed;
    session
}

#[test]
fn reject_grows_exclusions_by_exactly_one_and_resumes_searching() {
    let mut session = proposed_session(1);

    let rejected = session.reject().unwrap();

    assert_eq!(rejected, Uuid::from_u128(1));
    assert_eq!(session.excluded_slot_ids.len(), 1);
    assert!(session.excluded_slot_ids.contains(&rejected));
    assert!(session.current_proposal.is_none());
    assert_eq!(session.state, MatchSessionState::Searching);
}

#[test]
fn accept_commits_the_current_proposal() {
    let mut session = proposed_session(1);

    let slot = session.accept().unwrap();

    assert_eq!(slot.id, Uuid::from_u128(1));
    assert_eq!(session.state, MatchSessionState::Accepted);
    // The committed slot stays on the session for the booking committer.
    assert!(session.current_proposal.is_some());
}

#[test]
fn accept_outside_proposed_fails_and_leaves_state_unchanged() {
    let mut session = searching_session();

    let result = session.accept();

    assert_matches!(
        result,
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Searching))
    );
    assert_eq!(session.state, MatchSessionState::Searching);
}

#[test]
fn reject_from_a_terminal_state_fails_and_leaves_state_unchanged() {
    let mut session = proposed_session(1);
    session.accept().unwrap();

    let before = session.excluded_slot_ids.clone();
    let result = session.reject();

    assert_matches!(
        result,
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Accepted))
    );
    assert_eq!(session.state, MatchSessionState::Accepted);
    assert_eq!(session.excluded_slot_ids, before);
}

#[test]
fn cancel_is_valid_from_searching_and_proposed_only() {
    let mut from_searching = searching_session();
    assert!(from_searching.cancel().is_ok());
    assert_eq!(from_searching.state, MatchSessionState::Cancelled);

    let mut from_proposed = proposed_session(1);
    assert!(from_proposed.cancel().is_ok());
    assert!(from_proposed.current_proposal.is_none());

    // Not idempotent: cancelling a terminal session is a caller bug.
    let result = from_searching.cancel();
    assert_matches!(
        result,
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Cancelled))
    );
}

#[test]
fn expire_follows_the_same_rules_as_cancel() {
    let mut session = searching_session();
    assert!(session.expire().is_ok());
    assert_eq!(session.state, MatchSessionState::Cancelled);

    let mut accepted = proposed_session(1);
    accepted.accept().unwrap();
    assert_matches!(
        accepted.expire(),
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Accepted))
    );
}

#[test]
fn rollback_after_an_unreached_commit_reopens_the_proposal() {
    let mut session = proposed_session(1);
    session.excluded_slot_ids.insert(Uuid::from_u128(9));
    session.accept().unwrap();

    session.rollback_accept().unwrap();

    assert_eq!(session.state, MatchSessionState::Proposed);
    assert_eq!(
        session.current_proposal.as_ref().map(|s| s.id),
        Some(Uuid::from_u128(1))
    );
    // The slot was never contested, so nothing joins the exclusion set.
    assert_eq!(session.excluded_slot_ids.len(), 1);

    // The reopened proposal can be accepted again.
    assert!(session.accept().is_ok());
}

#[test]
fn rollback_requires_an_accepted_session() {
    let mut session = proposed_session(1);

    assert_matches!(
        session.rollback_accept(),
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Proposed))
    );
}

#[test]
fn commit_failure_recovery_excludes_the_lost_slot_and_resumes() {
    let mut session = proposed_session(1);
    session.accept().unwrap();

    let lost = session.recover_from_commit_failure().unwrap();

    assert_eq!(lost, Uuid::from_u128(1));
    assert_eq!(session.state, MatchSessionState::Searching);
    assert!(session.excluded_slot_ids.contains(&lost));
    assert!(session.current_proposal.is_none());
}

#[test]
fn commit_failure_recovery_requires_an_accepted_session() {
    let mut session = proposed_session(1);

    assert_matches!(
        session.recover_from_commit_failure(),
        Err(MatchingError::InvalidStateTransition(MatchSessionState::Proposed))
    );
}

#[test]
fn valid_operations_match_the_state_machine() {
    let searching = searching_session();
    assert_eq!(
        searching.valid_operations(),
        vec!["propose_next", "cancel", "expire"]
    );

    let proposed = proposed_session(1);
    assert_eq!(
        proposed.valid_operations(),
        vec!["accept", "reject", "cancel", "expire"]
    );

    let mut cancelled = searching_session();
    cancelled.cancel().unwrap();
    assert!(cancelled.valid_operations().is_empty());
}

#[test]
fn session_state_round_trips_through_serde() {
    let mut session = proposed_session(42);
    session.excluded_slot_ids.insert(Uuid::from_u128(7));

    let json = serde_json::to_string(&session).unwrap();
    let restored: MatchSession = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.assessment, session.assessment);
    assert_eq!(restored.excluded_slot_ids, session.excluded_slot_ids);
    assert_eq!(
        restored.current_proposal.as_ref().map(|s| s.id),
        session.current_proposal.as_ref().map(|s| s.id)
    );
    assert_eq!(restored.state, session.state);
}

// ==============================================================================
// SESSION STORE
// ==============================================================================

#[tokio::test]
async fn store_returns_not_found_for_unknown_sessions() {
    let store = SessionStore::new();

    let result = store.get(Uuid::from_u128(99)).await;
    assert_matches!(result, Err(MatchingError::SessionNotFound));
}

#[tokio::test]
async fn store_round_trips_sessions_by_id() {
    let store = SessionStore::new();
    let session = searching_session();
    let session_id = session.session_id;

    store.insert(session, SlotFilterCriteria::default()).await;

    let entry = store.get(session_id).await.unwrap();
    assert_eq!(entry.lock().await.session.session_id, session_id);

    store.remove(session_id).await;
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn sweep_expires_and_drops_stale_sessions() {
    let store = SessionStore::new();

    let mut stale = searching_session();
    stale.updated_at = Utc::now() - Duration::minutes(90);
    let fresh = searching_session();
    let fresh_id = fresh.session_id;

    store.insert(stale, SlotFilterCriteria::default()).await;
    store.insert(fresh, SlotFilterCriteria::default()).await;

    let swept = store.sweep_expired(30).await;

    assert_eq!(swept, 1);
    assert_eq!(store.len().await, 1);
    assert!(store.get(fresh_id).await.is_ok());
}
