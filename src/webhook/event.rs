//! Inbound Vapi webhook event model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound delivery, consumed once per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(
        rename = "functionCall",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tool invocation requested by the assistant's LLM loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Recognised event types. Dotted names are the dashboard contract; the
/// hyphenated ones are Vapi's server-message names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CallStarted,
    CallEnded,
    MessageCreated,
    Error,
    FunctionCall,
    Other(String),
}

impl EventKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "call.started" | "call-start" => Self::CallStarted,
            "call.ended" | "call-end" => Self::CallEnded,
            "message.created" | "transcript" => Self::MessageCreated,
            "error" => Self::Error,
            "function-call" => Self::FunctionCall,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CallStarted => "call.started",
            Self::CallEnded => "call.ended",
            Self::MessageCreated => "message.created",
            Self::Error => "error",
            Self::FunctionCall => "function-call",
            Self::Other(kind) => kind,
        }
    }
}

impl FunctionCall {
    /// Reads `{ name, parameters }` from any object. A non-string name is
    /// empty and non-object parameters are an empty map.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            name: object
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            parameters: object
                .get("parameters")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

impl WebhookEvent {
    /// Build an event from any well-formed JSON value. Fields of the wrong
    /// type count as absent; a non-object body is an event with no type.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => String::new(),
        };
        let call = map.remove("call").filter(Value::is_object);
        let message = map.remove("message").filter(Value::is_object);
        let function_call = map
            .remove("functionCall")
            .as_ref()
            .and_then(FunctionCall::from_value);
        let error = map.remove("error").filter(|error| !error.is_null());
        Self {
            kind,
            call,
            message,
            function_call,
            error,
            extra: map,
        }
    }

    pub fn event_kind(&self) -> EventKind {
        EventKind::parse(&self.kind)
    }

    /// Top-level `functionCall`, else `message.functionCall`.
    pub fn resolved_function_call(&self) -> Option<FunctionCall> {
        if let Some(call) = &self.function_call {
            return Some(call.clone());
        }
        FunctionCall::from_value(self.message.as_ref()?.get("functionCall")?)
    }

    /// Call id from `call.id`, falling back to `message.call_id` / `message.callId`.
    pub fn call_id(&self) -> Option<String> {
        let from_call = self
            .call
            .as_ref()
            .and_then(|call| call.get("id"))
            .and_then(Value::as_str);
        let from_message = || {
            let message = self.message.as_ref()?;
            message
                .get("call_id")
                .or_else(|| message.get("callId"))
                .and_then(Value::as_str)
        };
        from_call
            .or_else(from_message)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_dashboard_and_vapi_names() {
        assert_eq!(EventKind::parse("call.started"), EventKind::CallStarted);
        assert_eq!(EventKind::parse("call-end"), EventKind::CallEnded);
        assert_eq!(EventKind::parse("transcript"), EventKind::MessageCreated);
        assert_eq!(
            EventKind::parse("status-update"),
            EventKind::Other("status-update".to_string())
        );
    }

    #[test]
    fn missing_type_defaults_to_empty() {
        let event: WebhookEvent = serde_json::from_value(json!({ "call": { "id": "c1" } })).unwrap();
        assert_eq!(event.kind, "");
        assert_eq!(event.event_kind(), EventKind::Other(String::new()));
        assert_eq!(event.call_id().as_deref(), Some("c1"));
    }

    #[test]
    fn function_call_falls_back_to_message() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "type": "function-call",
            "message": {
                "functionCall": {
                    "name": "listVoicesForSector",
                    "parameters": { "sector": "salon" }
                }
            }
        }))
        .unwrap();

        let call = event.resolved_function_call().expect("function call");
        assert_eq!(call.name, "listVoicesForSector");
        assert_eq!(call.parameters["sector"], "salon");
    }

    #[test]
    fn mistyped_fields_count_as_absent() {
        let event = WebhookEvent::from_value(json!({
            "type": 42,
            "call": "c1",
            "message": null,
            "error": null,
            "timestamp": 7
        }));
        assert_eq!(event.kind, "");
        assert_eq!(event.call, None);
        assert_eq!(event.message, None);
        assert_eq!(event.error, None);
        assert_eq!(event.extra["timestamp"], 7);

        assert_eq!(WebhookEvent::from_value(json!([1, 2])), WebhookEvent::default());
        assert_eq!(WebhookEvent::from_value(json!({ "type": null })).kind, "");
    }

    #[test]
    fn null_parameters_become_empty() {
        let event = WebhookEvent::from_value(json!({
            "type": "function-call",
            "functionCall": { "name": "analyzeBusinessContext", "parameters": null }
        }));
        let call = event.resolved_function_call().expect("function call");
        assert_eq!(call.name, "analyzeBusinessContext");
        assert!(call.parameters.is_empty());

        let nested = WebhookEvent::from_value(json!({
            "type": "function-call",
            "message": { "functionCall": { "name": 3, "parameters": [1] } }
        }));
        let call = nested.resolved_function_call().expect("nested function call");
        assert_eq!(call.name, "");
        assert!(call.parameters.is_empty());
    }

    #[test]
    fn keeps_unknown_fields() {
        let event: WebhookEvent =
            serde_json::from_value(json!({ "type": "hang", "timestamp": 42 })).unwrap();
        assert_eq!(event.extra["timestamp"], 42);
    }
}
