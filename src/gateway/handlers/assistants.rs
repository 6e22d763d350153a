use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde_json::Value;

use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::handlers::creator_stamps;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{CREATE_ASSISTANT, UPDATE_ASSISTANT};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{AssistantParams, Stamped};

fn missing(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Assistant avec l'ID {id} non trouvé")
}

pub async fn assistants_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_assistants(request.list_params()).await?;
    listed(page, request)
}

pub async fn assistants_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Value>> {
    let assistant = state
        .vapi
        .get_assistant(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(assistant)
}

pub async fn assistants_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: AssistantParams = CREATE_ASSISTANT.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    let assistant = state.vapi.create_assistant(&params).await?;
    let assistant_id = assistant.get("id").and_then(Value::as_str).unwrap_or("-");
    tracing::info!(
        assistant_id = %assistant_id,
        user_id = %user.id,
        "Assistant created"
    );
    created(assistant)
}

pub async fn assistants_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: AssistantParams = UPDATE_ASSISTANT.parse(&body)?;
    let assistant = state
        .vapi
        .update_assistant(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(assistant)
}

pub async fn assistants_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_assistant(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    deleted(id)
}
