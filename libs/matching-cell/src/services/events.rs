// libs/matching-cell/src/services/events.rs
use tracing::info;

use crate::models::SessionEvent;

/// Receives terminal search outcomes so the host can notify the patient.
/// The delivery mechanism (email, push, websocket) is the host's concern.
pub trait SessionEventSink: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// Default sink: records the outcome in the log and nothing else.
pub struct LoggingEventSink;

impl SessionEventSink for LoggingEventSink {
    fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Accepted {
                session_id,
                booking,
            } => {
                info!(
                    "Search session {} accepted, booking {} confirmed",
                    session_id, booking.booking_id
                );
            }
            SessionEvent::Exhausted { session_id } => {
                info!("Search session {} exhausted the candidate pool", session_id);
            }
        }
    }
}
