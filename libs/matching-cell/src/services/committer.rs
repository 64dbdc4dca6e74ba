// libs/matching-cell/src/services/committer.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_slot_store::SlotStoreClient;

use crate::models::{BookingReference, CommitOutcome, MatchingError};

/// Converts an accepted match into a persisted booking. The commit is
/// the sole point of truth for slot ownership: a `Failed` outcome means
/// the slot was taken or withdrawn between proposal and acceptance, and
/// the session must resume searching rather than retry the same slot.
#[async_trait]
pub trait BookingCommitter: Send + Sync {
    async fn commit(
        &self,
        slot_id: Uuid,
        session_id: Uuid,
    ) -> Result<CommitOutcome, MatchingError>;
}

/// Commits bookings against the external slot store over REST. A 409
/// from the store means another patient won the race for the slot.
pub struct HttpBookingCommitter {
    client: SlotStoreClient,
}

impl HttpBookingCommitter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SlotStoreClient::new(config),
        }
    }

    fn parse_reference(
        body: &Value,
        slot_id: Uuid,
        session_id: Uuid,
    ) -> Result<BookingReference, MatchingError> {
        // Insert endpoints return the created row, sometimes wrapped in a
        // one-element array.
        const NULL: Value = Value::Null;
        let row = match body {
            Value::Array(rows) => rows.first().unwrap_or(&NULL),
            other => other,
        };

        let booking_id = row
            .get("booking_id")
            .or_else(|| row.get("id"))
            .and_then(|v| v.as_str())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| {
                MatchingError::CommitError(format!(
                    "booking endpoint confirmed without a booking id: {}",
                    row
                ))
            })?;

        let confirmed_at = match row.get("confirmed_at") {
            Some(value) => value
                .as_str()
                .and_then(|v| v.parse::<DateTime<Utc>>().ok())
                .ok_or_else(|| {
                    MatchingError::CommitError(format!(
                        "booking endpoint returned an unparseable confirmed_at: {}",
                        value
                    ))
                })?,
            None => Utc::now(),
        };

        Ok(BookingReference {
            booking_id,
            slot_id,
            session_id,
            confirmed_at,
        })
    }
}

#[async_trait]
impl BookingCommitter for HttpBookingCommitter {
    async fn commit(
        &self,
        slot_id: Uuid,
        session_id: Uuid,
    ) -> Result<CommitOutcome, MatchingError> {
        let body = json!({
            "slot_id": slot_id,
            "session_id": session_id,
        });

        let (status, response) = self
            .client
            .send(Method::POST, "/rest/v1/bookings", Some(body))
            .await
            .map_err(|e| MatchingError::CommitError(e.to_string()))?;

        if status == StatusCode::CONFLICT {
            let reason = response
                .get("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("slot no longer available")
                .to_string();

            warn!("Commit for slot {} lost the race: {}", slot_id, reason);
            return Ok(CommitOutcome::Failed { reason });
        }

        if !status.is_success() {
            return Err(MatchingError::CommitError(format!(
                "booking endpoint returned {}: {}",
                status, response
            )));
        }

        let reference = Self::parse_reference(&response, slot_id, session_id)?;
        info!(
            "Committed booking {} for slot {} (session {})",
            reference.booking_id, slot_id, session_id
        );

        Ok(CommitOutcome::Confirmed(reference))
    }
}
