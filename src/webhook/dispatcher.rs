//! Type-keyed dispatch of inbound webhook events.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::DispatchError;
use crate::tools::ToolRegistry;
use crate::webhook::event::{EventKind, FunctionCall, WebhookEvent};
use crate::webhook::ledger::CallLedger;

/// What became of a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Recorded,
    Duplicate,
    Logged,
    Skipped(&'static str),
    Ignored,
}

/// Seam between the receive route and event processing.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Apply a fire-and-forget event. Must be safe to call more than once
    /// with the same event.
    async fn handle(&self, event: WebhookEvent) -> Result<DispatchOutcome, DispatchError>;

    /// Run a function call and produce the `result` value. Never fails.
    async fn invoke_tool(&self, call: FunctionCall) -> Value;
}

pub struct EventDispatcher {
    ledger: Arc<dyn CallLedger>,
    tools: Arc<ToolRegistry>,
}

impl EventDispatcher {
    pub fn new(ledger: Arc<dyn CallLedger>, tools: Arc<ToolRegistry>) -> Self {
        Self { ledger, tools }
    }

    pub fn ledger(&self) -> &Arc<dyn CallLedger> {
        &self.ledger
    }
}

#[async_trait]
impl EventHandler for EventDispatcher {
    async fn handle(&self, event: WebhookEvent) -> Result<DispatchOutcome, DispatchError> {
        let kind = event.event_kind();
        let call_id = event.call_id();

        match kind {
            EventKind::CallStarted | EventKind::CallEnded | EventKind::MessageCreated => {
                let Some(call_id) = call_id else {
                    tracing::warn!(event_type = %kind.as_str(), "Event without call id, skipping");
                    return Ok(DispatchOutcome::Skipped("missing call id"));
                };
                let empty = json!({});
                let call = event.call.as_ref().unwrap_or(&empty);

                match kind {
                    EventKind::CallStarted => {
                        self.ledger.record_start(&call_id, call).await?;
                        tracing::info!(call_id = %call_id, "Call started");
                        Ok(DispatchOutcome::Recorded)
                    }
                    EventKind::CallEnded => {
                        self.ledger.record_end(&call_id, call).await?;
                        tracing::info!(call_id = %call_id, "Call ended");
                        Ok(DispatchOutcome::Recorded)
                    }
                    _ => {
                        let Some(message) = &event.message else {
                            return Ok(DispatchOutcome::Skipped("missing message"));
                        };
                        if self.ledger.append_message(&call_id, message).await? {
                            tracing::debug!(call_id = %call_id, "Message recorded");
                            Ok(DispatchOutcome::Recorded)
                        } else {
                            Ok(DispatchOutcome::Duplicate)
                        }
                    }
                }
            }
            EventKind::Error => {
                let payload = event.error.clone().unwrap_or(Value::Null);
                tracing::error!(
                    call_id = call_id.as_deref().unwrap_or("-"),
                    error = %payload,
                    "Vapi reported an error"
                );
                Ok(DispatchOutcome::Logged)
            }
            EventKind::FunctionCall => {
                // Answered synchronously by the receive route.
                Ok(DispatchOutcome::Ignored)
            }
            EventKind::Other(other) => {
                tracing::debug!(event_type = %other, "Unhandled event type");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    async fn invoke_tool(&self, call: FunctionCall) -> Value {
        tracing::info!(tool = %call.name, "Function call received");
        self.tools.invoke(&call.name, &call.parameters).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::webhook::ledger::{CallStatus, MemoryCallLedger};

    fn dispatcher() -> (EventDispatcher, Arc<MemoryCallLedger>) {
        let ledger = Arc::new(MemoryCallLedger::new(100));
        let tools = Arc::new(ToolRegistry::new(Duration::from_secs(1)));
        (EventDispatcher::new(ledger.clone(), tools), ledger)
    }

    fn event(value: Value) -> WebhookEvent {
        serde_json::from_value(value).expect("event")
    }

    #[tokio::test]
    async fn call_ended_twice_has_same_outcome() {
        let (dispatcher, ledger) = dispatcher();
        let ended = event(json!({
            "type": "call.ended",
            "call": { "id": "call_1", "endedReason": "assistant-ended-call" }
        }));

        let first = dispatcher.handle(ended.clone()).await.expect("first");
        let after_first = ledger.get("call_1").await;
        let second = dispatcher.handle(ended).await.expect("second");
        let after_second = ledger.get("call_1").await;

        assert_eq!(first, second);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.map(|r| r.status), Some(CallStatus::Ended));
    }

    #[tokio::test]
    async fn message_created_is_deduplicated() {
        let (dispatcher, _) = dispatcher();
        let created = event(json!({
            "type": "message.created",
            "call": { "id": "call_1" },
            "message": { "id": "m1", "role": "user", "content": "Allô" }
        }));

        assert_eq!(
            dispatcher.handle(created.clone()).await.unwrap(),
            DispatchOutcome::Recorded
        );
        assert_eq!(
            dispatcher.handle(created).await.unwrap(),
            DispatchOutcome::Duplicate
        );
    }

    #[tokio::test]
    async fn unknown_and_error_events_never_fail() {
        let (dispatcher, ledger) = dispatcher();
        assert_eq!(
            dispatcher
                .handle(event(json!({ "type": "speech-update" })))
                .await
                .unwrap(),
            DispatchOutcome::Ignored
        );
        assert_eq!(
            dispatcher
                .handle(event(json!({ "type": "error", "error": { "message": "boom" } })))
                .await
                .unwrap(),
            DispatchOutcome::Logged
        );
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn call_events_without_id_are_skipped() {
        let (dispatcher, ledger) = dispatcher();
        let outcome = dispatcher
            .handle(event(json!({ "type": "call.started" })))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped("missing call id"));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_in_result() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher
            .invoke_tool(FunctionCall {
                name: "doesNotExist".to_string(),
                parameters: Default::default(),
            })
            .await;
        assert_eq!(result["error"], "Function doesNotExist non reconnue");
    }
}
