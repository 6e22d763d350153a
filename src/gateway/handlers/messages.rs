//! Call transcript messages. The call is resolved first so a bad call id
//! reports the call, not the message, as missing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde_json::Value;

use crate::error::ApiError;
use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::CREATE_MESSAGE;
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{ListParams, MessageParams, Stamped};

const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Upper bound when scanning a call's transcript for one message.
const MESSAGE_SCAN_LIMIT: u32 = 1000;

async fn resolve_call(state: &GatewayState, call_id: &str) -> Result<Value, ApiError> {
    state
        .vapi
        .get_call(call_id)
        .await
        .map_err(not_found_as(|| format!("Appel avec l'ID {call_id} non trouvé")))
}

pub async fn messages_list_handler(
    State(state): State<Arc<GatewayState>>,
    Path(call_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    resolve_call(&state, &call_id).await?;
    let request = PageRequest::with_default_limit(&query, DEFAULT_MESSAGE_LIMIT);
    let page = state
        .vapi
        .list_messages(&call_id, request.list_params())
        .await?;
    listed(page, request)
}

pub async fn messages_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path((call_id, message_id)): Path<(String, String)>,
) -> ApiResult<Data<Value>> {
    resolve_call(&state, &call_id).await?;
    let page = state
        .vapi
        .list_messages(
            &call_id,
            ListParams {
                limit: MESSAGE_SCAN_LIMIT,
                offset: 0,
            },
        )
        .await?;
    let message = page
        .data
        .into_iter()
        .find(|m| m.get("id").and_then(Value::as_str) == Some(message_id.as_str()))
        .ok_or_else(|| ApiError::not_found(format!("Message avec l'ID {message_id} non trouvé")))?;
    ok(message)
}

pub async fn messages_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(call_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: MessageParams = CREATE_MESSAGE.parse(&body)?;
    resolve_call(&state, &call_id).await?;
    params.stamp(&[("user_id", user.id.as_str())]);
    let message = state.vapi.create_message(&call_id, &params).await?;
    tracing::debug!(call_id = %call_id, role = %params.role, "Message created");
    created(message)
}
