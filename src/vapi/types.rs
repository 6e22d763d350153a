//! Parameter and record shapes exchanged with Vapi.
//!
//! Records keep unrecognised fields in `extra` so nothing Vapi returns is
//! lost when the gateway re-serialises them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Limit/offset window sent to Vapi list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u64,
}

/// A page of records with the totals Vapi reported (or that we inferred).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VapiFunction {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Remote webhook registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuiteParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCaseParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartRunParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRunParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteWorkflowParams {
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadMember {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SquadParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<SquadMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Dashboard uses snake_case; Vapi's assistant API is camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Value>,
    #[serde(
        rename = "firstMessage",
        alias = "first_message",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageParams {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Records that can carry creator stamps in their metadata.
pub trait Stamped {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>>;

    fn stamp(&mut self, entries: &[(&str, &str)]) {
        let metadata = self.metadata_mut().get_or_insert_with(Map::new);
        for (key, value) in entries {
            metadata.insert((*key).to_string(), Value::String((*value).to_string()));
        }
    }
}

impl Stamped for FunctionParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for TestSuiteParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for TestCaseParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for StartRunParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for WorkflowParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for SquadParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for AssistantParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

impl Stamped for MessageParams {
    fn metadata_mut(&mut self) -> &mut Option<Map<String, Value>> {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn function_record_keeps_unknown_fields() {
        let record: VapiFunction = serde_json::from_value(json!({
            "id": "fn_1",
            "name": "lookup",
            "parameters": { "type": "object" },
            "orgId": "org_9"
        }))
        .unwrap();
        assert_eq!(record.extra["orgId"], "org_9");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["orgId"], "org_9");
        assert!(back.get("webhook_url").is_none());
    }

    #[test]
    fn assistant_params_accept_snake_case_and_emit_camel_case() {
        let params: AssistantParams =
            serde_json::from_value(json!({ "name": "Accueil", "first_message": "Bonjour" }))
                .unwrap();
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["firstMessage"], "Bonjour");
        assert!(wire.get("first_message").is_none());
    }

    #[test]
    fn stamp_merges_into_existing_metadata() {
        let mut params = FunctionParams {
            metadata: Some(serde_json::from_value(json!({ "source": "wizard" })).unwrap()),
            ..Default::default()
        };
        params.stamp(&[("user_id", "u1"), ("organization_id", "org_1")]);
        let metadata = params.metadata.unwrap();
        assert_eq!(metadata["source"], "wizard");
        assert_eq!(metadata["user_id"], "u1");
        assert_eq!(metadata["organization_id"], "org_1");
    }
}
