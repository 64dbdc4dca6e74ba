// libs/matching-cell/src/services/pool.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_slot_store::SlotStoreClient;

use crate::models::{AppointmentSlot, MatchingError, SlotFilterCriteria};

/// Supplies the candidate pool of currently-open slots. The pool is
/// shared with other patients' searches and may change between calls;
/// callers must treat every fetch as a snapshot.
#[async_trait]
pub trait SlotProvider: Send + Sync {
    async fn fetch_open_slots(
        &self,
        criteria: &SlotFilterCriteria,
    ) -> Result<Vec<AppointmentSlot>, MatchingError>;
}

/// Fetches open slots from the external slot store over REST.
pub struct HttpSlotProvider {
    client: SlotStoreClient,
}

impl HttpSlotProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SlotStoreClient::new(config),
        }
    }

    fn build_path(criteria: &SlotFilterCriteria) -> String {
        let mut query_parts = vec!["status=eq.open".to_string()];

        if let Some(practice_id) = criteria.practice_id {
            query_parts.push(format!("practice_id=eq.{}", practice_id));
        }
        if let Some(ref treatment_type) = criteria.treatment_type {
            query_parts.push(format!("treatment_type=eq.{}", treatment_type));
        }
        if let Some(not_before) = criteria.not_before {
            query_parts.push(format!("start_time=gte.{}", not_before.to_rfc3339()));
        }

        format!(
            "/rest/v1/open_slots?{}&order=start_time.asc",
            query_parts.join("&")
        )
    }
}

#[async_trait]
impl SlotProvider for HttpSlotProvider {
    async fn fetch_open_slots(
        &self,
        criteria: &SlotFilterCriteria,
    ) -> Result<Vec<AppointmentSlot>, MatchingError> {
        let path = Self::build_path(criteria);

        let slots: Vec<AppointmentSlot> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| MatchingError::SlotStoreError(e.to_string()))?;

        debug!("Fetched {} open slots from slot store", slots.len());
        Ok(slots)
    }
}
