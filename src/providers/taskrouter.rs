//! TaskRouter cumulative statistics provider
//!
//! Resolves a task queue by friendly name and fetches its cumulative
//! statistics from the TaskRouter REST API.

use crate::config::TwilioSettings;
use crate::error::{GatekeeperError, Result};
use crate::providers::QueueStatsProvider;
use crate::types::QueueStats;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const UPSTREAM: &str = "taskrouter";

#[derive(Debug, Deserialize)]
struct TaskQueueList {
    task_queues: Vec<TaskQueueResource>,
}

#[derive(Debug, Deserialize)]
struct TaskQueueResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct CumulativeStatisticsResource {
    wait_duration_until_accepted: WaitDurationResource,
}

#[derive(Debug, Deserialize)]
struct WaitDurationResource {
    #[serde(default)]
    avg: f64,
}

/// Fetches queue statistics from TaskRouter
pub struct TaskRouterStatsProvider {
    http_client: reqwest::Client,
    base_url: String,
    workspace_sid: String,
    account_sid: String,
    auth_token: String,
}

impl TaskRouterStatsProvider {
    pub fn new(settings: &TwilioSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(http_client: reqwest::Client, settings: &TwilioSettings) -> Self {
        Self {
            http_client,
            base_url: settings.taskrouter_base_url.trim_end_matches('/').to_string(),
            workspace_sid: settings.workspace_sid.clone(),
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
        }
    }

    fn queues_url(&self) -> String {
        format!(
            "{}/v1/Workspaces/{}/TaskQueues",
            self.base_url, self.workspace_sid
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .context("TaskRouter request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatekeeperError::UpstreamRequestFailed {
                upstream: UPSTREAM.to_string(),
                message: format!("unexpected status {}", status),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .context("Failed to decode TaskRouter response")
    }

    async fn try_fetch(&self, task_queue_name: &str) -> Result<QueueStats> {
        if task_queue_name.is_empty() {
            return Err(GatekeeperError::UpstreamRequestFailed {
                upstream: UPSTREAM.to_string(),
                message: "task queue name is required".to_string(),
            }
            .into());
        }

        let queues: TaskQueueList = self
            .get_json(
                self.http_client
                    .get(self.queues_url())
                    .query(&[("FriendlyName", task_queue_name)]),
            )
            .await?;

        let task_queue_sid = queues
            .task_queues
            .into_iter()
            .next()
            .map(|queue| queue.sid)
            .ok_or_else(|| GatekeeperError::UpstreamRequestFailed {
                upstream: UPSTREAM.to_string(),
                message: format!("no task queue named '{}'", task_queue_name),
            })?;

        let statistics: CumulativeStatisticsResource = self
            .get_json(self.http_client.get(format!(
                "{}/{}/CumulativeStatistics",
                self.queues_url(),
                task_queue_sid
            )))
            .await?;

        debug!(
            "Fetched statistics for '{}' ({}): avg wait {}s",
            task_queue_name, task_queue_sid, statistics.wait_duration_until_accepted.avg
        );

        Ok(QueueStats::new(
            task_queue_sid,
            statistics.wait_duration_until_accepted.avg,
        ))
    }
}

#[async_trait]
impl QueueStatsProvider for TaskRouterStatsProvider {
    async fn fetch_queue_stats(&self, task_queue_name: &str) -> QueueStats {
        match self.try_fetch(task_queue_name).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    "Failed to fetch statistics for task queue '{}': {:#}",
                    task_queue_name, e
                );
                QueueStats::unsuccessful()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> TwilioSettings {
        TwilioSettings {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            workspace_sid: "WS123".to_string(),
            taskrouter_base_url: base_url.to_string(),
            ..TwilioSettings::default()
        }
    }

    #[tokio::test]
    async fn test_fetches_statistics_by_friendly_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/Workspaces/WS123/TaskQueues"))
            .and(query_param("FriendlyName", "Sales"))
            .and(basic_auth("AC123", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_queues": [{ "sid": "WQ42", "friendly_name": "Sales" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/Workspaces/WS123/TaskQueues/WQ42/CumulativeStatistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_queue_sid": "WQ42",
                "wait_duration_until_accepted": { "avg": 754, "min": 3, "max": 1200, "total": 9000 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TaskRouterStatsProvider::new(&settings(&server.uri()));
        let stats = provider.fetch_queue_stats("Sales").await;

        assert_eq!(stats, QueueStats::new("WQ42", 754.0));
    }

    #[tokio::test]
    async fn test_unknown_queue_is_unsuccessful() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/Workspaces/WS123/TaskQueues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_queues": [] })))
            .mount(&server)
            .await;

        let provider = TaskRouterStatsProvider::new(&settings(&server.uri()));
        let stats = provider.fetch_queue_stats("Missing").await;

        assert!(!stats.success);
        assert!(stats.cumulative_stats.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_unsuccessful() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = TaskRouterStatsProvider::new(&settings(&server.uri()));
        assert!(!provider.fetch_queue_stats("Sales").await.success);
    }

    #[tokio::test]
    async fn test_empty_name_skips_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = TaskRouterStatsProvider::new(&settings(&server.uri()));
        assert!(!provider.fetch_queue_stats("").await.success);
    }
}
