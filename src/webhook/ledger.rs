//! Call ledger: what the dispatcher records about calls.
//!
//! Deliveries can be retried and reordered upstream, so every write here is
//! idempotent and order-tolerant: an end may arrive before its start, and
//! replaying an event leaves the record unchanged.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::DispatchError;

/// Oldest messages are dropped beyond this.
const MAX_MESSAGES_PER_CALL: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    InProgress,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMessage {
    pub id: Option<String>,
    pub role: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub call_id: String,
    pub status: CallStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_reason: Option<String>,
    pub end_metadata: Option<Value>,
    pub messages: Vec<CallMessage>,
}

impl CallRecord {
    fn new(call_id: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            status: CallStatus::InProgress,
            started_at: None,
            ended_at: None,
            ended_reason: None,
            end_metadata: None,
            messages: Vec::new(),
        }
    }
}

#[async_trait]
pub trait CallLedger: Send + Sync {
    async fn record_start(&self, call_id: &str, call: &Value) -> Result<(), DispatchError>;

    async fn record_end(&self, call_id: &str, call: &Value) -> Result<(), DispatchError>;

    /// Returns `false` when the message was already recorded.
    async fn append_message(&self, call_id: &str, message: &Value) -> Result<bool, DispatchError>;

    async fn get(&self, call_id: &str) -> Option<CallRecord>;
}

struct LedgerState {
    calls: HashMap<String, CallRecord>,
    order: VecDeque<String>,
}

/// Bounded in-process ledger. Evicts the oldest call once full.
pub struct MemoryCallLedger {
    state: RwLock<LedgerState>,
    capacity: usize,
}

impl MemoryCallLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                calls: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.calls.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl LedgerState {
    fn entry(&mut self, call_id: &str, capacity: usize) -> &mut CallRecord {
        if !self.calls.contains_key(call_id) {
            while self.calls.len() >= capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.calls.remove(&oldest);
                tracing::debug!(call_id = %oldest, "Evicted call from ledger");
            }
            self.order.push_back(call_id.to_string());
        }
        self.calls
            .entry(call_id.to_string())
            .or_insert_with(|| CallRecord::new(call_id))
    }
}

fn timestamp_field(call: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| call.get(*key).and_then(Value::as_str))
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl CallLedger for MemoryCallLedger {
    async fn record_start(&self, call_id: &str, call: &Value) -> Result<(), DispatchError> {
        let started_at =
            timestamp_field(call, &["startedAt", "started_at"]).unwrap_or_else(Utc::now);
        let mut state = self.state.write().await;
        let record = state.entry(call_id, self.capacity);
        if record.started_at.is_none() {
            record.started_at = Some(started_at);
        }
        Ok(())
    }

    async fn record_end(&self, call_id: &str, call: &Value) -> Result<(), DispatchError> {
        let reported = timestamp_field(call, &["endedAt", "ended_at"]);
        let reason = call
            .get("endedReason")
            .or_else(|| call.get("ended_reason"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut state = self.state.write().await;
        let record = state.entry(call_id, self.capacity);
        record.status = CallStatus::Ended;
        record.ended_at = match (reported, record.ended_at) {
            (Some(reported), _) => Some(reported),
            (None, Some(existing)) => Some(existing),
            (None, None) => Some(Utc::now()),
        };
        if reason.is_some() {
            record.ended_reason = reason;
        }
        record.end_metadata = Some(call.clone());
        Ok(())
    }

    async fn append_message(&self, call_id: &str, message: &Value) -> Result<bool, DispatchError> {
        if !message.is_object() {
            return Err(DispatchError::InvalidPayload {
                field: "message",
                reason: "expected a JSON object".to_string(),
            });
        }
        let id = message.get("id").and_then(Value::as_str).map(str::to_string);
        let role = message
            .get("role")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut state = self.state.write().await;
        let record = state.entry(call_id, self.capacity);
        let duplicate = match &id {
            Some(id) => record.messages.iter().any(|m| m.id.as_deref() == Some(id)),
            None => record.messages.iter().any(|m| &m.payload == message),
        };
        if duplicate {
            return Ok(false);
        }
        if record.messages.len() >= MAX_MESSAGES_PER_CALL {
            record.messages.remove(0);
        }
        record.messages.push(CallMessage {
            id,
            role,
            payload: message.clone(),
        });
        Ok(true)
    }

    async fn get(&self, call_id: &str) -> Option<CallRecord> {
        self.state.read().await.calls.get(call_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn end_before_start_is_tolerated() {
        let ledger = MemoryCallLedger::new(10);
        let ended = json!({ "id": "c1", "endedAt": "2026-01-01T10:05:00Z", "endedReason": "hangup" });
        let started = json!({ "id": "c1", "startedAt": "2026-01-01T10:00:00Z" });

        ledger.record_end("c1", &ended).await.unwrap();
        ledger.record_start("c1", &started).await.unwrap();

        let record = ledger.get("c1").await.expect("record");
        assert_eq!(record.status, CallStatus::Ended);
        assert_eq!(record.ended_reason.as_deref(), Some("hangup"));
        assert_eq!(
            record.started_at.map(|t| t.to_rfc3339()),
            Some("2026-01-01T10:00:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn replayed_end_is_stable() {
        let ledger = MemoryCallLedger::new(10);
        let ended = json!({ "id": "c1", "endedReason": "customer-ended-call" });

        ledger.record_end("c1", &ended).await.unwrap();
        let first = ledger.get("c1").await;
        ledger.record_end("c1", &ended).await.unwrap();
        let second = ledger.get("c1").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn messages_are_deduplicated() {
        let ledger = MemoryCallLedger::new(10);
        let with_id = json!({ "id": "m1", "role": "user", "content": "Bonjour" });
        let without_id = json!({ "role": "assistant", "content": "Salut" });

        assert!(ledger.append_message("c1", &with_id).await.unwrap());
        assert!(!ledger.append_message("c1", &with_id).await.unwrap());
        assert!(ledger.append_message("c1", &without_id).await.unwrap());
        assert!(!ledger.append_message("c1", &without_id).await.unwrap());

        let record = ledger.get("c1").await.unwrap();
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].role.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn rejects_non_object_messages() {
        let ledger = MemoryCallLedger::new(10);
        let err = ledger.append_message("c1", &json!("text")).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPayload { field: "message", .. }));
    }

    #[tokio::test]
    async fn evicts_oldest_call_when_full() {
        let ledger = MemoryCallLedger::new(2);
        for id in ["a", "b", "c"] {
            ledger.record_start(id, &json!({})).await.unwrap();
        }
        assert_eq!(ledger.len().await, 2);
        assert!(ledger.get("a").await.is_none());
        assert!(ledger.get("c").await.is_some());
    }
}
