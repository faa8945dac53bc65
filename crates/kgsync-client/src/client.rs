//! reqwest-backed backend client

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use kgsync_config::BackendConfig;
use kgsync_core::{Envelope, GraphBackend, PayloadType, SyncStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// `{ success, message }` reply used by the write endpoints
#[derive(Debug, Deserialize)]
struct ApiResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

/// [`GraphBackend`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
    source: String,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            source: config.source.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `source` stamped on outgoing envelopes
    pub fn source(&self) -> &str {
        &self.source
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str) -> ClientResult<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;
        check_status(url, response)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;
        check_status(url, response)
    }

    async fn try_sync_status(&self) -> ClientResult<SyncStatus> {
        let response = self.get("/sync/status").await?;
        let url = response.url().to_string();
        response
            .json::<SyncStatus>()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    async fn try_update_sync_timestamp(&self) -> ClientResult<()> {
        let response = self.post("/sync/update", &json!({})).await?;
        let url = response.url().to_string();
        let reply: ApiResponse = response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })?;
        if reply.success {
            Ok(())
        } else {
            Err(ClientError::Rejected(reply.message))
        }
    }

    async fn try_send_diagnostic(
        &self,
        graph_name: &str,
        message: &str,
        details: Value,
    ) -> ClientResult<()> {
        let payload = json!({ "message": message, "details": details });
        let envelope = Envelope::new(&self.source, graph_name, PayloadType::Diagnostic, &payload)?;
        self.post("/data", &envelope).await.map(|_| ())
    }
}

fn check_status(url: String, response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            url,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl GraphBackend for HttpBackendClient {
    async fn is_available(&self) -> bool {
        match self.get("/").await {
            Ok(_) => true,
            Err(e) => {
                warn!("Backend at {} unavailable: {}", self.base_url, e);
                false
            }
        }
    }

    async fn send(&self, envelope: &Envelope) -> bool {
        match self.post("/data", envelope).await {
            Ok(_) => {
                debug!(
                    payload_type = %envelope.payload_type,
                    bytes = envelope.payload.len(),
                    "Envelope accepted"
                );
                true
            }
            Err(e) => {
                warn!(payload_type = %envelope.payload_type, "Send failed: {}", e);
                false
            }
        }
    }

    async fn sync_status(&self) -> Option<SyncStatus> {
        match self.try_sync_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Could not fetch sync status: {}", e);
                None
            }
        }
    }

    async fn update_sync_timestamp(&self) -> bool {
        match self.try_update_sync_timestamp().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not update sync timestamp: {}", e);
                false
            }
        }
    }

    async fn send_diagnostic(&self, graph_name: &str, message: &str, details: Value) {
        if let Err(e) = self.try_send_diagnostic(graph_name, message, details).await {
            warn!("Could not send diagnostic: {}", e);
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
