use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::tools::{
    ANALYZE_BUSINESS_CONTEXT, CREATE_COMPLETE_ASSISTANT, LIST_VOICES_FOR_SECTOR, ToolHandler,
};

/// HTTP client for the configurator tool endpoints.
#[derive(Clone)]
pub struct ToolsClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<SecretString>,
}

impl ToolsClient {
    pub fn new(base_url: impl Into<String>, bearer: Option<SecretString>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(&config.base_url, config.bearer.clone(), config.timeout)
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ToolError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.http.post(&url).json(body);
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer.expose_secret());
        }

        let response = request.send().await.map_err(|e| ToolError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ToolError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ToolError::Upstream {
                endpoint: endpoint.to_string(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text).map_err(|e| ToolError::Transport {
            endpoint: endpoint.to_string(),
            reason: format!("invalid JSON response: {e}"),
        })
    }
}

/// A tool that validates a required-field set and forwards selected
/// parameters to one configurator endpoint.
pub struct ForwardingTool {
    name: &'static str,
    description: &'static str,
    endpoint: &'static str,
    required: &'static [&'static str],
    missing_message: &'static str,
    forwarded: &'static [&'static str],
    defaults: &'static [(&'static str, &'static str)],
    client: ToolsClient,
}

impl ForwardingTool {
    fn missing(&self, parameters: &Map<String, Value>) -> bool {
        self.required
            .iter()
            .any(|key| parameters.get(*key).is_none_or(is_blank))
    }

    fn payload(&self, parameters: &Map<String, Value>) -> Value {
        let mut body = Map::new();
        for key in self.forwarded {
            if let Some(value) = parameters.get(*key).filter(|v| !v.is_null()) {
                body.insert((*key).to_string(), value.clone());
            }
        }
        for (key, default) in self.defaults {
            body.entry((*key).to_string())
                .or_insert_with(|| Value::String((*default).to_string()));
        }
        Value::Object(body)
    }
}

/// JS-style falsy check for required parameters.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    }
}

#[async_trait]
impl ToolHandler for ForwardingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn execute(&self, parameters: &Map<String, Value>) -> Result<Value, ToolError> {
        if self.missing(parameters) {
            return Err(ToolError::MissingParameters(self.missing_message.to_string()));
        }
        self.client
            .post(self.endpoint, &self.payload(parameters))
            .await
    }
}

/// The three configurator tools exposed to the assistant.
pub fn configurator_tools(client: ToolsClient) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(ForwardingTool {
            name: ANALYZE_BUSINESS_CONTEXT,
            description: "Detects the business sector and recommends a template.",
            endpoint: "analyze-business",
            required: &["description"],
            missing_message: "Parameter description manquant",
            forwarded: &["description"],
            defaults: &[],
            client: client.clone(),
        }),
        Arc::new(ForwardingTool {
            name: LIST_VOICES_FOR_SECTOR,
            description: "Recommends voices for a business sector.",
            endpoint: "list-voices",
            required: &["sector"],
            missing_message: "Parameter sector manquant",
            forwarded: &["sector", "language", "businessName"],
            defaults: &[("language", "fr")],
            client: client.clone(),
        }),
        Arc::new(ForwardingTool {
            name: CREATE_COMPLETE_ASSISTANT,
            description: "Creates the configured assistant on Vapi.",
            endpoint: "create-assistant",
            required: &["businessName", "sector", "selectedVoice"],
            missing_message: "Parameters businessName, sector et selectedVoice requis",
            forwarded: &[
                "businessName",
                "sector",
                "selectedVoice",
                "template",
                "knowledgeBaseIds",
                "customInstructions",
                "userId",
            ],
            defaults: &[],
            client,
        }),
    ]
}
