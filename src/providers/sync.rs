//! Sync document provider for per-queue configuration

use crate::config::TwilioSettings;
use crate::error::{GatekeeperError, Result};
use crate::providers::QueueConfigProvider;
use crate::types::{QueueConfig, TaskQueueConfig};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const UPSTREAM: &str = "sync";

#[derive(Debug, Deserialize)]
struct SyncDocument {
    #[serde(default)]
    data: TaskQueueConfig,
}

/// Reads the queue configuration document from a Sync service
pub struct SyncConfigProvider {
    http_client: reqwest::Client,
    base_url: String,
    service_sid: String,
    document_prefix: String,
    account_sid: String,
    auth_token: String,
}

impl SyncConfigProvider {
    pub fn new(settings: &TwilioSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(http_client: reqwest::Client, settings: &TwilioSettings) -> Self {
        Self {
            http_client,
            base_url: settings.sync_base_url.trim_end_matches('/').to_string(),
            service_sid: settings.sync_service_sid.clone(),
            document_prefix: settings.queue_config_document_prefix.clone(),
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
        }
    }

    fn document_url(&self, task_queue_sid: &str) -> String {
        format!(
            "{}/v1/Services/{}/Documents/{}{}",
            self.base_url, self.service_sid, self.document_prefix, task_queue_sid
        )
    }

    async fn try_fetch(&self, task_queue_sid: &str) -> Result<QueueConfig> {
        if task_queue_sid.is_empty() {
            return Err(GatekeeperError::UpstreamRequestFailed {
                upstream: UPSTREAM.to_string(),
                message: "task queue SID is required".to_string(),
            }
            .into());
        }

        let response = self
            .http_client
            .get(self.document_url(task_queue_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .context("Sync request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatekeeperError::UpstreamRequestFailed {
                upstream: UPSTREAM.to_string(),
                message: format!("unexpected status {}", status),
            }
            .into());
        }

        let document: SyncDocument = response
            .json()
            .await
            .context("Failed to decode Sync document")?;

        debug!(
            "Fetched queue config for {}: callback_enabled={}",
            task_queue_sid, document.data.callback_enabled
        );

        Ok(QueueConfig {
            success: true,
            task_queue_config: Some(document.data),
        })
    }
}

#[async_trait]
impl QueueConfigProvider for SyncConfigProvider {
    async fn fetch_queue_config(&self, task_queue_sid: &str) -> QueueConfig {
        match self.try_fetch(task_queue_sid).await {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to fetch queue config for '{}': {:#}",
                    task_queue_sid, e
                );
                QueueConfig::unsuccessful()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> TwilioSettings {
        TwilioSettings {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            sync_service_sid: "IS123".to_string(),
            sync_base_url: base_url.to_string(),
            queue_config_document_prefix: "queue-config-".to_string(),
            ..TwilioSettings::default()
        }
    }

    #[tokio::test]
    async fn test_reads_callback_flag_from_document() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/Services/IS123/Documents/queue-config-WQ42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "unique_name": "queue-config-WQ42",
                "data": { "callback_enabled": true, "voicemail_enabled": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = SyncConfigProvider::new(&settings(&server.uri()));
        let config = provider.fetch_queue_config("WQ42").await;

        assert!(config.success);
        assert!(config.callback_enabled());
    }

    #[tokio::test]
    async fn test_missing_flag_defaults_to_disabled() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .mount(&server)
            .await;

        let provider = SyncConfigProvider::new(&settings(&server.uri()));
        let config = provider.fetch_queue_config("WQ42").await;

        assert!(config.success);
        assert!(!config.callback_enabled());
    }

    #[tokio::test]
    async fn test_missing_document_is_unsuccessful() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = SyncConfigProvider::new(&settings(&server.uri()));
        let config = provider.fetch_queue_config("WQ42").await;

        assert_eq!(config, QueueConfig::unsuccessful());
    }
}
