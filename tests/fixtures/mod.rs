//! Test fixtures and mock upstreams for integration testing

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use gatekeeper::cache::ManualClock;
use gatekeeper::config::{AppConfig, TwilioSettings};
use gatekeeper::providers::{StaticConfigProvider, StaticStatsProvider};
use gatekeeper::service::{AppState, HttpServer, HttpServerConfig, WEBHOOK_PATH};
use gatekeeper::types::{QueueConfig, QueueStats};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SAMPLE_AUDIO_URL: &str = "https://assets.example.com/sample-12s.mp3";
pub const DEFAULT_REDIRECT_URL: &str = "https://handler.example.com/twiml/default-queue";
pub const CALLBACK_DOMAIN: &str = "gatekeeper.example.com";
pub const WORKSPACE_SID: &str = "WS00000000000000000000000000000001";
pub const SYNC_SERVICE_SID: &str = "IS00000000000000000000000000000001";
pub const DOCUMENT_PREFIX: &str = "queue-config-";

/// Configuration with a 10 minute callback threshold and fixed assets
pub fn test_config(twilio: TwilioSettings) -> AppConfig {
    let mut config = AppConfig::default();
    config.twilio = twilio;
    config.gatekeeper.ewt_threshold_minutes = 10;
    config.gatekeeper.sample_audio_url = SAMPLE_AUDIO_URL.to_string();
    config.gatekeeper.default_redirect_url = DEFAULT_REDIRECT_URL.to_string();
    config.gatekeeper.callback_domain = CALLBACK_DOMAIN.to_string();
    config
}

/// Mock TaskRouter and Sync APIs served from one wiremock server
pub struct TwilioMock {
    pub server: MockServer,
}

impl TwilioMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn settings(&self) -> TwilioSettings {
        TwilioSettings {
            account_sid: "AC00000000000000000000000000000001".to_string(),
            auth_token: "test-token".to_string(),
            workspace_sid: WORKSPACE_SID.to_string(),
            sync_service_sid: SYNC_SERVICE_SID.to_string(),
            taskrouter_base_url: self.server.uri(),
            sync_base_url: self.server.uri(),
            queue_config_document_prefix: DOCUMENT_PREFIX.to_string(),
        }
    }

    /// Serve the queue lookup and statistics for one queue, expecting `fetches` of each
    pub async fn mount_statistics(&self, name: &str, sid: &str, avg_wait: f64, fetches: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/Workspaces/{}/TaskQueues", WORKSPACE_SID)))
            .and(query_param("FriendlyName", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_queues": [{ "sid": sid, "friendly_name": name }]
            })))
            .expect(fetches)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/v1/Workspaces/{}/TaskQueues/{}/CumulativeStatistics",
                WORKSPACE_SID, sid
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_queue_sid": sid,
                "wait_duration_until_accepted": { "avg": avg_wait }
            })))
            .expect(fetches)
            .mount(&self.server)
            .await;
    }

    /// Fail every statistics request with the given status
    pub async fn mount_statistics_failure(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/Workspaces/{}/TaskQueues", WORKSPACE_SID)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve the configuration document for a queue, expecting `fetches` reads
    pub async fn mount_config(&self, sid: &str, callback_enabled: bool, fetches: u64) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/v1/Services/{}/Documents/{}{}",
                SYNC_SERVICE_SID, DOCUMENT_PREFIX, sid
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "unique_name": format!("{}{}", DOCUMENT_PREFIX, sid),
                "data": { "callback_enabled": callback_enabled }
            })))
            .expect(fetches)
            .mount(&self.server)
            .await;
    }

    /// Fail configuration reads for a queue, expecting `fetches` reads
    pub async fn mount_config_failure(&self, sid: &str, fetches: u64) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/v1/Services/{}/Documents/{}{}",
                SYNC_SERVICE_SID, DOCUMENT_PREFIX, sid
            )))
            .respond_with(ResponseTemplate::new(500))
            .expect(fetches)
            .mount(&self.server)
            .await;
    }

    /// Running app state talking to this mock through the real providers
    pub async fn app_state(&self) -> Arc<AppState> {
        let app_state = Arc::new(
            AppState::new(test_config(self.settings())).expect("Failed to create app state"),
        );
        app_state.start().await;
        app_state
    }
}

/// Running app state backed by fixed provider results
pub async fn static_app_state(
    stats: Arc<StaticStatsProvider>,
    config: Arc<StaticConfigProvider>,
    clock: Arc<ManualClock>,
) -> Arc<AppState> {
    let app_state = Arc::new(
        AppState::with_providers(
            test_config(TwilioSettings::default()),
            stats,
            config,
            clock,
        )
        .expect("Failed to create app state"),
    );
    app_state.start().await;
    app_state
}

/// Static providers answering for `WQ1` with the given wait and callback flag
pub fn static_providers(
    avg_wait: f64,
    callback_enabled: bool,
) -> (Arc<StaticStatsProvider>, Arc<StaticConfigProvider>) {
    (
        Arc::new(StaticStatsProvider::new(QueueStats::new("WQ1", avg_wait))),
        Arc::new(StaticConfigProvider::new(QueueConfig::new(callback_enabled))),
    )
}

pub fn router(app_state: Arc<AppState>) -> Router {
    HttpServer::new(HttpServerConfig::default(), app_state).create_router()
}

/// Webhook answer as seen by Studio
#[derive(Debug)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

/// POST a form-encoded event to the webhook
pub async fn post_event(router: &Router, params: &[(&str, &str)]) -> WebhookResponse {
    let body = reqwest::Url::parse_with_params("http://localhost/", params)
        .unwrap()
        .query()
        .unwrap_or_default()
        .to_string();

    let request = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    send(router, request).await
}

/// GET the webhook with a raw query string
pub async fn get_event(router: &Router, query: &str) -> WebhookResponse {
    let uri = if query.is_empty() {
        WEBHOOK_PATH.to_string()
    } else {
        format!("{}?{}", WEBHOOK_PATH, query)
    };
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> WebhookResponse {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    WebhookResponse {
        status,
        content_type,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

/// Expected TwiML document for the given verbs
pub fn twiml(verbs: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
        verbs
    )
}

/// Callback redirect URL as rendered inside `<Redirect>`
pub fn callback_redirect(queue_sid: &str, call_sid: &str) -> String {
    format!(
        "https://{}/features/callback-and-voicemail/studio/wait-experience?mode=opt-out-choice&amp;QueueSid={}&amp;CallSid={}",
        CALLBACK_DOMAIN, queue_sid, call_sid
    )
}
