//! Vapi webhook ingestion: signature checks, event model, dispatch.

pub mod dispatcher;
pub mod event;
pub mod ledger;
pub mod signature;

use std::sync::Arc;

pub use self::dispatcher::{DispatchOutcome, EventDispatcher, EventHandler};
pub use self::event::{EventKind, FunctionCall, WebhookEvent};
pub use self::ledger::{CallLedger, CallRecord, CallStatus, MemoryCallLedger};
pub use self::signature::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, sign};

/// Process `event` in the background. Errors and panics are logged, never
/// propagated.
pub fn spawn_dispatch(handler: Arc<dyn EventHandler>, event: WebhookEvent) {
    let event_type = event.kind.clone();
    let task = tokio::spawn(async move {
        match handler.handle(event).await {
            Ok(outcome) => {
                tracing::debug!(event_type = %event_type, ?outcome, "Webhook event dispatched");
            }
            Err(e) => {
                tracing::warn!(event_type = %event_type, error = %e, "Webhook event dispatch failed");
            }
        }
    });

    tokio::spawn(async move {
        if let Err(join_err) = task.await
            && join_err.is_panic()
        {
            tracing::error!("Webhook dispatch task panicked");
        }
    });
}
