use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derive_builder::Builder;
use reqwest::Response;
use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::messages::{
    ApiErrorEnvelope, DeviceStatePatch, DeviceStateSnapshot, SNAPSHOT_ATTRIBUTES,
};

pub const DEFAULT_BASE_URL: &str = "https://neviweb.com/api";
const SESSION_HEADER: &str = "Session-Id";

#[derive(Error, Debug)]
pub enum NeviwebClientError {
    #[error("Invalid client options: {0}")]
    OptionsError(String),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Neviweb API error {code} (HTTP {status})")]
    ApiError { status: u16, code: String },
    #[error("Failed to decode response: {0}")]
    DecodeError(String),
}

/// Read/write access to the cloud-side state of a single device.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn fetch_device(&self, device_id: &str)
    -> Result<DeviceStateSnapshot, NeviwebClientError>;

    async fn update_device(
        &self,
        device_id: &str,
        patch: &DeviceStatePatch,
    ) -> Result<(), NeviwebClientError>;
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct NeviwebOptions {
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    pub base_url: String,
    pub session_id: String,
    #[builder(default = "Duration::from_secs(15)")]
    pub timeout: Duration,
}

impl NeviwebOptions {
    pub fn builder() -> NeviwebOptionsBuilder {
        NeviwebOptionsBuilder::default()
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

/// HTTP client for the Neviweb device attribute endpoints. Cheap to clone.
#[derive(Clone)]
pub struct NeviwebClient {
    inner: Arc<Inner>,
}

impl NeviwebClient {
    pub fn new(options: NeviwebOptions) -> Result<Self, NeviwebClientError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;
        let base_url = options.base_url.trim_end_matches('/').to_string();
        info!("Neviweb client created for {}", base_url);
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                session_id: options.session_id,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn attribute_url(&self, device_id: &str) -> String {
        format!("{}/device/{}/attribute", self.inner.base_url, device_id)
    }

    /// Turns an HTTP response into its JSON body, mapping both HTTP errors
    /// and in-band `{"error": ...}` payloads to [`NeviwebClientError`].
    async fn read_body(response: Response) -> Result<serde_json::Value, NeviwebClientError> {
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str::<serde_json::Value>(&text)
                .map_err(|e| NeviwebClientError::DecodeError(e.to_string()))?
        };

        if let Ok(envelope) = serde_json::from_value::<ApiErrorEnvelope>(body.clone()) {
            debug!(
                "API error payload: {} {:?}",
                envelope.error.code, envelope.error.data
            );
            return Err(NeviwebClientError::ApiError {
                status: status.as_u16(),
                code: envelope.error.code,
            });
        }

        if !status.is_success() {
            return Err(NeviwebClientError::ApiError {
                status: status.as_u16(),
                code: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl DeviceApi for NeviwebClient {
    async fn fetch_device(
        &self,
        device_id: &str,
    ) -> Result<DeviceStateSnapshot, NeviwebClientError> {
        let url = self.attribute_url(device_id);
        debug!("Fetching device {} from {}", device_id, url);
        let response = self
            .inner
            .http
            .get(&url)
            .header(SESSION_HEADER, &self.inner.session_id)
            .query(&[("attributes", SNAPSHOT_ATTRIBUTES.join(","))])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        serde_json::from_value::<DeviceStateSnapshot>(body)
            .map_err(|e| NeviwebClientError::DecodeError(e.to_string()))
    }

    async fn update_device(
        &self,
        device_id: &str,
        patch: &DeviceStatePatch,
    ) -> Result<(), NeviwebClientError> {
        let url = self.attribute_url(device_id);
        debug!("Updating device {} with {:?}", device_id, patch);
        let response = self
            .inner
            .http
            .put(&url)
            .header(SESSION_HEADER, &self.inner.session_id)
            .json(patch)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }
}
