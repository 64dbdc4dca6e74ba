// libs/matching-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

// ==============================================================================
// INTAKE AND URGENCY MODELS
// ==============================================================================

/// A patient's triage answers for one open-search attempt. Immutable once
/// submitted; a changed answer means a new search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeAnswers {
    /// Self-reported pain on a 0-10 scale.
    pub pain_level: u8,
    pub issue_duration: IssueDuration,
    pub symptom_flags: Vec<SymptomFlag>,
    /// Maximum distance the patient is willing to travel. `None` means
    /// unbounded.
    pub max_travel_distance_km: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueDuration {
    Today,
    Days,
    Week,
    Longer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomFlag {
    Swelling,
    Bleeding,
    Sensitivity,
    CosmeticOnly,
}

/// Derived urgency, computed exactly once per submitted IntakeAnswers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    pub score: u32,
    pub tier: UrgencyTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Routine,
    Moderate,
    High,
    Emergency,
}

impl UrgencyTier {
    /// Urgent tiers rank slots by earliest start; the rest rank by
    /// proximity first.
    pub fn prioritizes_earliest(&self) -> bool {
        matches!(self, UrgencyTier::Emergency | UrgencyTier::High)
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyTier::Routine => write!(f, "routine"),
            UrgencyTier::Moderate => write!(f, "moderate"),
            UrgencyTier::High => write!(f, "high"),
            UrgencyTier::Emergency => write!(f, "emergency"),
        }
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// One bookable opening, owned by the external slot store and read-only
/// to this cell. `distance_km` is computed by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub dentist_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub distance_km: f64,
    pub treatment_type: String,
}

/// Pass-through filter for the slot store query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotFilterCriteria {
    pub practice_id: Option<Uuid>,
    pub treatment_type: Option<String>,
    pub not_before: Option<DateTime<Utc>>,
}

// ==============================================================================
// MATCH SESSION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSessionState {
    Searching,
    Proposed,
    Accepted,
    Exhausted,
    Cancelled,
}

impl MatchSessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchSessionState::Accepted
                | MatchSessionState::Exhausted
                | MatchSessionState::Cancelled
        )
    }
}

impl fmt::Display for MatchSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSessionState::Searching => write!(f, "searching"),
            MatchSessionState::Proposed => write!(f, "proposed"),
            MatchSessionState::Accepted => write!(f, "accepted"),
            MatchSessionState::Exhausted => write!(f, "exhausted"),
            MatchSessionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One patient's open search. Invariants:
/// - `current_proposal` is never a member of `excluded_slot_ids`
/// - `excluded_slot_ids` only grows; a rejected slot is never re-offered
/// - terminal states admit no further transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSession {
    pub session_id: Uuid,
    pub assessment: UrgencyAssessment,
    pub max_travel_distance_km: Option<f64>,
    pub excluded_slot_ids: HashSet<Uuid>,
    pub current_proposal: Option<AppointmentSlot>,
    pub state: MatchSessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchSession {
    pub fn new(assessment: UrgencyAssessment, max_travel_distance_km: Option<f64>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            assessment,
            max_travel_distance_km,
            excluded_slot_ids: HashSet::new(),
            current_proposal: None,
            state: MatchSessionState::Searching,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Receipt from the external booking committer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReference {
    pub booking_id: Uuid,
    pub slot_id: Uuid,
    pub session_id: Uuid,
    pub confirmed_at: DateTime<Utc>,
}

/// Result of a commit attempt. The committer is the sole point of truth
/// for slot ownership; `Failed` usually means another patient won the
/// race for the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommitOutcome {
    Confirmed(BookingReference),
    Failed { reason: String },
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSearchRequest {
    pub patient_id: Uuid,
    pub intake: IntakeAnswers,
    #[serde(default)]
    pub criteria: SlotFilterCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub session_id: Uuid,
    pub assessment: UrgencyAssessment,
    pub state: MatchSessionState,
    pub proposal: Option<AppointmentSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptResponse {
    pub session_id: Uuid,
    pub state: MatchSessionState,
    /// Present when the commit succeeded.
    pub booking: Option<BookingReference>,
    /// Present when the commit was lost to a race and a replacement slot
    /// was proposed.
    pub proposal: Option<AppointmentSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub assessment: UrgencyAssessment,
    pub state: MatchSessionState,
    pub excluded_slot_ids: HashSet<Uuid>,
    pub current_proposal: Option<AppointmentSlot>,
}

impl From<&MatchSession> for SessionView {
    fn from(session: &MatchSession) -> Self {
        Self {
            session_id: session.session_id,
            assessment: session.assessment,
            state: session.state,
            excluded_slot_ids: session.excluded_slot_ids.clone(),
            current_proposal: session.current_proposal.clone(),
        }
    }
}

// ==============================================================================
// SESSION EVENTS
// ==============================================================================

/// Emitted when a search reaches an outcome the host should notify the
/// patient about. Delivery is the host's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Accepted {
        session_id: Uuid,
        booking: BookingReference,
    },
    Exhausted {
        session_id: Uuid,
    },
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum MatchingError {
    #[error("Invalid intake answers: {0}")]
    InvalidInput(String),

    #[error("Operation not allowed while session is {0}")]
    InvalidStateTransition(MatchSessionState),

    #[error("Search session not found")]
    SessionNotFound,

    #[error("Slot store error: {0}")]
    SlotStoreError(String),

    #[error("Booking commit error: {0}")]
    CommitError(String),
}
