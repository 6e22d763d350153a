//! Webhook registrations and the inbound Vapi delivery endpoint.
//!
//! `POST /webhooks/receive` is the only unauthenticated resource route. It
//! acknowledges as soon as the delivery is parsed and verified; processing
//! happens in the background, except for `function-call` events whose tool
//! result is the response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::gateway::auth::{AuthenticatedUser, require_admin};
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{CREATE_WEBHOOK, UPDATE_WEBHOOK};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{Webhook, WebhookParams};
use crate::webhook::{EventKind, WebhookEvent, spawn_dispatch};

pub const INVALID_SIGNATURE: &str = "Signature de webhook invalide";
pub const INVALID_JSON: &str = "Corps de requête JSON invalide";
pub const MISSING_FUNCTION_CALL: &str = "functionCall manquant";

fn missing(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Webhook avec l'ID {id} non trouvé")
}

pub async fn receive_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => WebhookEvent::from_value(value),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected webhook with unparseable body");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": INVALID_JSON })))
                .into_response();
        }
    };

    if let Err(e) = state.verifier.verify(&headers, &body) {
        tracing::warn!(reason = %e, event_type = %event.kind, "Rejected webhook signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": INVALID_SIGNATURE })),
        )
            .into_response();
    }

    if event.event_kind() == EventKind::FunctionCall {
        let result = match event.resolved_function_call() {
            Some(call) => state.events.invoke_tool(call).await,
            None => json!({ "error": MISSING_FUNCTION_CALL }),
        };
        return Json(json!({ "result": result })).into_response();
    }

    tracing::debug!(event_type = %event.kind, "Webhook accepted");
    spawn_dispatch(state.events.clone(), event);
    Json(json!({ "success": true })).into_response()
}

pub async fn webhooks_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Webhook>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_webhooks(request.list_params()).await?;
    listed(page, request)
}

pub async fn webhooks_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Webhook>> {
    let webhook = state
        .vapi
        .get_webhook(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(webhook)
}

pub async fn webhooks_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Webhook>> {
    require_admin(&user)?;
    let params: WebhookParams = CREATE_WEBHOOK.parse(&body)?;
    let webhook = state.vapi.create_webhook(&params).await?;
    tracing::info!(webhook_id = %webhook.id, url = %webhook.url, "Webhook registered");
    created(webhook)
}

pub async fn webhooks_update_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Webhook>> {
    require_admin(&user)?;
    let params: WebhookParams = UPDATE_WEBHOOK.parse(&body)?;
    let webhook = state
        .vapi
        .update_webhook(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(webhook)
}

pub async fn webhooks_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    require_admin(&user)?;
    state
        .vapi
        .delete_webhook(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    tracing::info!(webhook_id = %id, "Webhook deleted");
    deleted(id)
}

pub async fn webhooks_ping_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<PingResult>> {
    state
        .vapi
        .ping_webhook(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(PingResult {
        success: true,
        message: "Webhook testé avec succès",
    })
}
