//! Typed Vapi resource operations over a [`VapiTransport`].

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::VapiConfig;
use crate::error::VapiError;
use crate::vapi::transport::{HttpTransport, VapiRequest, VapiTransport};
use crate::vapi::types::*;

#[derive(Clone)]
pub struct VapiClient {
    transport: Arc<dyn VapiTransport>,
}

/// Percent-encode one path segment.
fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn to_body<B: Serialize>(endpoint: &str, body: &B) -> Result<Value, VapiError> {
    serde_json::to_value(body).map_err(|e| VapiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: format!("failed to encode request: {e}"),
    })
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, VapiError> {
    serde_json::from_value(value).map_err(|e| VapiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Accepts a bare array or `{ data, pagination: { total, has_more } }`.
fn decode_page<T: DeserializeOwned>(
    endpoint: &str,
    value: Value,
    params: ListParams,
) -> Result<Page<T>, VapiError> {
    let (items, total, has_more) = match value {
        Value::Array(items) => (items, None, None),
        Value::Object(mut map) => {
            let pagination = map.remove("pagination").unwrap_or(Value::Null);
            let items = match map.remove("data") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(VapiError::InvalidResponse {
                        endpoint: endpoint.to_string(),
                        reason: format!("expected data array, got {other}"),
                    });
                }
            };
            (
                items,
                pagination.get("total").and_then(Value::as_u64),
                pagination.get("has_more").and_then(Value::as_bool),
            )
        }
        other => {
            return Err(VapiError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("expected list response, got {other}"),
            });
        }
    };

    let seen = params.offset + items.len() as u64;
    let total = total.unwrap_or(seen);
    let has_more = has_more.unwrap_or(seen < total);
    let data = items
        .into_iter()
        .map(|item| decode(endpoint, item))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        data,
        total,
        has_more,
    })
}

impl VapiClient {
    pub fn new(transport: Arc<dyn VapiTransport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &VapiConfig) -> Result<Self, VapiError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: ListParams,
    ) -> Result<Page<T>, VapiError> {
        let request = VapiRequest::get(path)
            .with_query("limit", params.limit)
            .with_query("offset", params.offset);
        let value = self.transport.send(request).await?;
        decode_page(path, value, params)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, VapiError> {
        let value = self.transport.send(VapiRequest::get(path)).await?;
        decode(path, value)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, VapiError> {
        let request = VapiRequest::post(path, to_body(path, body)?);
        let value = self.transport.send(request).await?;
        decode(path, value)
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, VapiError> {
        let request = VapiRequest::patch(path, to_body(path, body)?);
        let value = self.transport.send(request).await?;
        decode(path, value)
    }

    async fn remove(&self, path: &str) -> Result<(), VapiError> {
        self.transport.send(VapiRequest::delete(path)).await?;
        Ok(())
    }

    // --- Assistants ---

    pub async fn list_assistants(&self, params: ListParams) -> Result<Page<Value>, VapiError> {
        self.list("assistants", params).await
    }

    pub async fn get_assistant(&self, id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("assistant/{}", seg(id))).await
    }

    pub async fn create_assistant<B: Serialize>(&self, body: &B) -> Result<Value, VapiError> {
        self.post("assistant", body).await
    }

    pub async fn update_assistant(
        &self,
        id: &str,
        params: &AssistantParams,
    ) -> Result<Value, VapiError> {
        self.patch(&format!("assistant/{}", seg(id)), params).await
    }

    pub async fn delete_assistant(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("assistant/{}", seg(id))).await
    }

    // --- Functions ---

    pub async fn list_functions(&self, params: ListParams) -> Result<Page<VapiFunction>, VapiError> {
        self.list("functions", params).await
    }

    pub async fn get_function(&self, id: &str) -> Result<VapiFunction, VapiError> {
        self.fetch(&format!("functions/{}", seg(id))).await
    }

    pub async fn create_function(&self, params: &FunctionParams) -> Result<VapiFunction, VapiError> {
        self.post("functions", params).await
    }

    pub async fn update_function(
        &self,
        id: &str,
        params: &FunctionParams,
    ) -> Result<VapiFunction, VapiError> {
        self.patch(&format!("functions/{}", seg(id)), params).await
    }

    pub async fn delete_function(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("functions/{}", seg(id))).await
    }

    // --- Calls and messages ---

    pub async fn get_call(&self, call_id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("calls/{}", seg(call_id))).await
    }

    pub async fn list_messages(
        &self,
        call_id: &str,
        params: ListParams,
    ) -> Result<Page<Value>, VapiError> {
        self.list(&format!("calls/{}/messages", seg(call_id)), params)
            .await
    }

    pub async fn create_message(
        &self,
        call_id: &str,
        params: &MessageParams,
    ) -> Result<Value, VapiError> {
        self.post(&format!("calls/{}/messages", seg(call_id)), params)
            .await
    }

    // --- Test suites ---

    pub async fn list_test_suites(&self, params: ListParams) -> Result<Page<Value>, VapiError> {
        self.list("test-suites", params).await
    }

    pub async fn get_test_suite(&self, id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("test-suites/{}", seg(id))).await
    }

    pub async fn create_test_suite(&self, params: &TestSuiteParams) -> Result<Value, VapiError> {
        self.post("test-suites", params).await
    }

    pub async fn update_test_suite(
        &self,
        id: &str,
        params: &TestSuiteParams,
    ) -> Result<Value, VapiError> {
        self.patch(&format!("test-suites/{}", seg(id)), params).await
    }

    pub async fn delete_test_suite(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("test-suites/{}", seg(id))).await
    }

    // --- Test suite tests ---

    fn tests_path(suite_id: &str) -> String {
        format!("test-suites/{}/tests", seg(suite_id))
    }

    pub async fn list_tests(
        &self,
        suite_id: &str,
        params: ListParams,
    ) -> Result<Page<Value>, VapiError> {
        self.list(&Self::tests_path(suite_id), params).await
    }

    pub async fn get_test(&self, suite_id: &str, test_id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("{}/{}", Self::tests_path(suite_id), seg(test_id)))
            .await
    }

    pub async fn create_test(
        &self,
        suite_id: &str,
        params: &TestCaseParams,
    ) -> Result<Value, VapiError> {
        self.post(&Self::tests_path(suite_id), params).await
    }

    pub async fn update_test(
        &self,
        suite_id: &str,
        test_id: &str,
        params: &TestCaseParams,
    ) -> Result<Value, VapiError> {
        self.patch(
            &format!("{}/{}", Self::tests_path(suite_id), seg(test_id)),
            params,
        )
        .await
    }

    pub async fn delete_test(&self, suite_id: &str, test_id: &str) -> Result<(), VapiError> {
        self.remove(&format!("{}/{}", Self::tests_path(suite_id), seg(test_id)))
            .await
    }

    // --- Test suite runs ---

    fn runs_path(suite_id: &str) -> String {
        format!("test-suite/{}/run", seg(suite_id))
    }

    pub async fn list_runs(
        &self,
        suite_id: &str,
        params: ListParams,
    ) -> Result<Page<Value>, VapiError> {
        self.list(&Self::runs_path(suite_id), params).await
    }

    pub async fn get_run(&self, suite_id: &str, run_id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("{}/{}", Self::runs_path(suite_id), seg(run_id)))
            .await
    }

    pub async fn start_run(
        &self,
        suite_id: &str,
        params: &StartRunParams,
    ) -> Result<Value, VapiError> {
        self.post(&Self::runs_path(suite_id), params).await
    }

    pub async fn update_run(
        &self,
        suite_id: &str,
        run_id: &str,
        params: &UpdateRunParams,
    ) -> Result<Value, VapiError> {
        self.patch(
            &format!("{}/{}", Self::runs_path(suite_id), seg(run_id)),
            params,
        )
        .await
    }

    pub async fn delete_run(&self, suite_id: &str, run_id: &str) -> Result<(), VapiError> {
        self.remove(&format!("{}/{}", Self::runs_path(suite_id), seg(run_id)))
            .await
    }

    // --- Organization ---

    pub async fn get_organization(&self) -> Result<Value, VapiError> {
        self.fetch("organization").await
    }

    pub async fn update_organization(
        &self,
        params: &OrganizationParams,
    ) -> Result<Value, VapiError> {
        self.patch("organization", params).await
    }

    pub async fn get_organization_limits(&self) -> Result<Value, VapiError> {
        self.fetch("organization/limits").await
    }

    // --- Webhooks ---

    pub async fn list_webhooks(&self, params: ListParams) -> Result<Page<Webhook>, VapiError> {
        self.list("webhooks", params).await
    }

    pub async fn get_webhook(&self, id: &str) -> Result<Webhook, VapiError> {
        self.fetch(&format!("webhooks/{}", seg(id))).await
    }

    pub async fn create_webhook(&self, params: &WebhookParams) -> Result<Webhook, VapiError> {
        self.post("webhooks", params).await
    }

    pub async fn update_webhook(
        &self,
        id: &str,
        params: &WebhookParams,
    ) -> Result<Webhook, VapiError> {
        self.patch(&format!("webhooks/{}", seg(id)), params).await
    }

    pub async fn delete_webhook(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("webhooks/{}", seg(id))).await
    }

    pub async fn ping_webhook(&self, id: &str) -> Result<(), VapiError> {
        let path = format!("webhooks/{}/ping", seg(id));
        self.transport
            .send(VapiRequest::post(path, Value::Object(Default::default())))
            .await?;
        Ok(())
    }

    // --- Workflows ---

    pub async fn list_workflows(&self, params: ListParams) -> Result<Page<Value>, VapiError> {
        self.list("workflows", params).await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("workflows/{}", seg(id))).await
    }

    pub async fn create_workflow(&self, params: &WorkflowParams) -> Result<Value, VapiError> {
        self.post("workflows", params).await
    }

    pub async fn update_workflow(
        &self,
        id: &str,
        params: &WorkflowParams,
    ) -> Result<Value, VapiError> {
        self.patch(&format!("workflows/{}", seg(id)), params).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("workflows/{}", seg(id))).await
    }

    pub async fn execute_workflow(
        &self,
        id: &str,
        params: &ExecuteWorkflowParams,
    ) -> Result<Value, VapiError> {
        self.post(&format!("workflows/{}/execute", seg(id)), params)
            .await
    }

    // --- Squads ---

    pub async fn list_squads(&self, params: ListParams) -> Result<Page<Value>, VapiError> {
        self.list("squads", params).await
    }

    pub async fn get_squad(&self, id: &str) -> Result<Value, VapiError> {
        self.fetch(&format!("squads/{}", seg(id))).await
    }

    pub async fn create_squad(&self, params: &SquadParams) -> Result<Value, VapiError> {
        self.post("squads", params).await
    }

    pub async fn update_squad(&self, id: &str, params: &SquadParams) -> Result<Value, VapiError> {
        self.patch(&format!("squads/{}", seg(id)), params).await
    }

    pub async fn delete_squad(&self, id: &str) -> Result<(), VapiError> {
        self.remove(&format!("squads/{}", seg(id))).await
    }

    pub async fn add_squad_members(
        &self,
        id: &str,
        members: &[SquadMember],
    ) -> Result<Value, VapiError> {
        self.post(
            &format!("squads/{}/members", seg(id)),
            &serde_json::json!({ "members": members }),
        )
        .await
    }

    pub async fn remove_squad_member(&self, id: &str, member_id: &str) -> Result<(), VapiError> {
        self.remove(&format!("squads/{}/members/{}", seg(id), seg(member_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    /// Records requests and replies with a canned value.
    struct Recorder {
        reply: Value,
        seen: Mutex<Vec<VapiRequest>>,
    }

    #[async_trait]
    impl VapiTransport for Recorder {
        async fn send(&self, request: VapiRequest) -> Result<Value, VapiError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn client(reply: Value) -> (VapiClient, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        (VapiClient::new(recorder.clone()), recorder)
    }

    #[tokio::test]
    async fn list_sends_limit_and_offset() {
        let (client, recorder) = client(json!({
            "data": [{ "id": "wh_1", "url": "https://a.example", "events": ["call.ended"] }],
            "pagination": { "total": 41, "has_more": true }
        }));

        let page = client
            .list_webhooks(ListParams {
                limit: 20,
                offset: 20,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 41);
        assert!(page.has_more);
        assert_eq!(page.data[0].id, "wh_1");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].path, "webhooks");
        assert_eq!(
            seen[0].query,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("offset".to_string(), "20".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn bare_array_pages_infer_totals() {
        let (client, _) = client(json!([{ "id": "a" }, { "id": "b" }]));
        let page = client
            .list_squads(ListParams {
                limit: 20,
                offset: 40,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 42);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn ids_are_path_encoded() {
        let (client, recorder) = client(json!({}));
        client.get_run("suite 1", "../run").await.unwrap();
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].path, "test-suite/suite%201/run/..%2Frun");
    }

    #[tokio::test]
    async fn squad_members_are_wrapped() {
        let (client, recorder) = client(json!({ "id": "sq_1" }));
        client
            .add_squad_members(
                "sq_1",
                &[SquadMember {
                    id: "asst_1".to_string(),
                    role: Some("lead".to_string()),
                }],
            )
            .await
            .unwrap();
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].path, "squads/sq_1/members");
        assert_eq!(
            seen[0].body,
            Some(json!({ "members": [{ "id": "asst_1", "role": "lead" }] }))
        );
    }
}
