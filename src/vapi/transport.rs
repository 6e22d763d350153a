//! Raw request/response plumbing to the Vapi REST API.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::config::VapiConfig;
use crate::error::VapiError;

/// One call to the Vapi API. `path` is relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct VapiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl VapiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Only GETs are retried; a retried POST could create twice.
    pub fn is_idempotent(&self) -> bool {
        self.method == Method::GET
    }

    fn sends_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH
    }
}

#[async_trait]
pub trait VapiTransport: Send + Sync {
    async fn send(&self, request: VapiRequest) -> Result<Value, VapiError>;
}

/// reqwest-backed transport with bounded, jittered retry for GETs.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    max_retries: u32,
    retry_base: Duration,
}

impl HttpTransport {
    pub fn new(config: &VapiConfig) -> Result<Self, VapiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VapiError::Transport {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_base: config.retry_base,
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_base.as_millis() as u64;
        let exp = base_ms.saturating_mul(1u64 << attempt.min(10));
        let jitter = if base_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=base_ms)
        };
        Duration::from_millis(exp.saturating_add(jitter))
    }

    async fn send_once(&self, request: &VapiRequest) -> Result<Value, VapiError> {
        let endpoint = request.path.trim_start_matches('/').to_string();
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .bearer_auth(self.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.sends_body()
            && let Some(body) = &request.body
        {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| VapiError::Transport {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| VapiError::Transport {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(VapiError::Status {
                endpoint,
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text).map_err(|e| VapiError::InvalidResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

/// Prefer the JSON `message` field, else the raw body.
fn error_message(text: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let from_json = parsed.as_ref().and_then(|v| match v.get("message") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    });
    match from_json {
        Some(message) if !message.is_empty() => message,
        _ if text.trim().is_empty() => "Unknown error".to_string(),
        _ => text.trim().to_string(),
    }
}

#[async_trait]
impl VapiTransport for HttpTransport {
    async fn send(&self, request: VapiRequest) -> Result<Value, VapiError> {
        let max_attempts = if request.is_idempotent() {
            self.max_retries + 1
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        endpoint = %request.path,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying Vapi request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport(server: &MockServer, max_retries: u32) -> HttpTransport {
        HttpTransport::new(&VapiConfig {
            api_key: SecretString::from("vapi-key"),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries,
            retry_base: Duration::from_millis(1),
        })
        .expect("transport")
    }

    #[tokio::test]
    async fn sends_bearer_query_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/functions"))
            .and(query_param("limit", "20"))
            .and(header("authorization", "Bearer vapi-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/functions"))
            .and(body_json(json!({ "name": "lookup" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "fn_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server, 0);
        let listed = transport
            .send(VapiRequest::get("functions").with_query("limit", 20))
            .await
            .unwrap();
        assert_eq!(listed, json!([]));

        let created = transport
            .send(VapiRequest::post("functions", json!({ "name": "lookup" })))
            .await
            .unwrap();
        assert_eq!(created["id"], "fn_1");
    }

    #[tokio::test]
    async fn empty_body_becomes_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/functions/fn_1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let value = transport(&server, 0)
            .send(VapiRequest::delete("functions/fn_1"))
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn error_status_uses_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/functions/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server, 3)
            .send(VapiRequest::get("functions/missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Erreur API Vapi (functions/missing): 404 - Not Found");
    }

    #[tokio::test]
    async fn retries_get_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organization"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "org_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let value = transport(&server, 3)
            .send(VapiRequest::get("organization"))
            .await
            .unwrap();
        assert_eq!(value["id"], "org_1");
    }

    #[tokio::test]
    async fn never_retries_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server, 3)
            .send(VapiRequest::post("functions", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, VapiError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn gives_up_after_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/squads"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = transport(&server, 2)
            .send(VapiRequest::get("squads"))
            .await
            .unwrap_err();
        assert!(matches!(err, VapiError::Status { status: 500, .. }));
    }
}
