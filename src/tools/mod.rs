//! Function-call tools invoked from `function-call` webhook events.
//!
//! The caller is an LLM loop waiting on the HTTP response, so every
//! invocation is time-bounded and failures come back as `{ "error": ... }`
//! values instead of HTTP errors.

mod forwarding;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::ToolError;

pub use self::forwarding::{ForwardingTool, ToolsClient, configurator_tools};

pub const ANALYZE_BUSINESS_CONTEXT: &str = "analyzeBusinessContext";
pub const LIST_VOICES_FOR_SECTOR: &str = "listVoicesForSector";
pub const CREATE_COMPLETE_ASSISTANT: &str = "createCompleteAssistant";

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, parameters: &Map<String, Value>) -> Result<Value, ToolError>;
}

/// Fixed set of named tool handlers.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: BTreeMap::new(),
            timeout,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn ToolHandler>>) -> Self {
        for tool in tools {
            self.register(tool);
        }
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Run `name` with `parameters`. Never fails: unknown tools, errors and
    /// timeouts all become `{ "error": ... }`.
    pub async fn invoke(&self, name: &str, parameters: &Map<String, Value>) -> Value {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "Unknown function-call tool");
            return json!({
                "error": format!("Function {name} non reconnue"),
                "available_functions": self.names(),
            });
        };

        let started = std::time::Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, tool.execute(parameters)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool: name.to_string(),
                secs: self.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(value) => {
                tracing::info!(tool = %name, elapsed_ms = started.elapsed().as_millis() as u64, "Tool call succeeded");
                value
            }
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "Tool call failed");
                json!({ "error": err.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Returns its parameters."
        }

        async fn execute(&self, parameters: &Map<String, Value>) -> Result<Value, ToolError> {
            Ok(Value::Object(parameters.clone()))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl ToolHandler for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps past any sane timeout."
        }

        async fn execute(&self, _parameters: &Map<String, Value>) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Duration::from_millis(50))
            .with_tools([
                Arc::new(EchoTool) as Arc<dyn ToolHandler>,
                Arc::new(SlowTool) as Arc<dyn ToolHandler>,
            ])
    }

    #[tokio::test]
    async fn unknown_tool_lists_available_functions() {
        let result = registry().invoke("nope", &Map::new()).await;
        assert_eq!(result["error"], "Function nope non reconnue");
        assert_eq!(result["available_functions"], json!(["echo", "slow"]));
    }

    #[tokio::test]
    async fn returns_tool_output() {
        let mut params = Map::new();
        params.insert("a".to_string(), json!(1));
        assert_eq!(registry().invoke("echo", &params).await, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn timeout_becomes_error_value() {
        let result = registry().invoke("slow", &Map::new()).await;
        let message = result["error"].as_str().expect("error string");
        assert!(message.starts_with("Erreur appel slow"));
    }
}
