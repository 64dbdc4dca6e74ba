use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slot_store_url: String,
    pub slot_store_api_key: String,
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            slot_store_url: env::var("SLOT_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("SLOT_STORE_URL not set, using empty value");
                    String::new()
                }),
            slot_store_api_key: env::var("SLOT_STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("SLOT_STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SESSION_TTL_MINUTES not set, using default of 30");
                    30
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.slot_store_url.is_empty() && !self.slot_store_api_key.is_empty()
    }
}
