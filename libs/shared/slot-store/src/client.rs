use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// REST client for the external slot store that owns open appointment
/// slots and persisted bookings.
pub struct SlotStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SlotStoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.slot_store_url.clone(),
            api_key: config.slot_store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (status, value) = self.send(method, path, body).await?;

        if !status.is_success() {
            error!("Slot store error ({}): {}", status, value);

            return Err(match status.as_u16() {
                404 => anyhow!("Resource not found: {}", value),
                _ => anyhow!("Slot store error ({}): {}", status, value),
            });
        }

        let data = serde_json::from_value(value)?;
        Ok(data)
    }

    /// Raw variant that hands back the status code with the body. The
    /// booking committer needs the status to tell a lost race (409) apart
    /// from a transport failure.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url).headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok((status, value))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
