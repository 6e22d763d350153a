use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde_json::Value;

use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::handlers::creator_stamps;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{CREATE_WORKFLOW, EXECUTE_WORKFLOW, UPDATE_WORKFLOW};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{ExecuteWorkflowParams, Stamped, WorkflowParams};

fn missing(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Workflow avec l'ID {id} non trouvé")
}

pub async fn workflows_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_workflows(request.list_params()).await?;
    listed(page, request)
}

pub async fn workflows_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Value>> {
    let workflow = state
        .vapi
        .get_workflow(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(workflow)
}

pub async fn workflows_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: WorkflowParams = CREATE_WORKFLOW.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    created(state.vapi.create_workflow(&params).await?)
}

pub async fn workflows_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: WorkflowParams = UPDATE_WORKFLOW.parse(&body)?;
    let workflow = state
        .vapi
        .update_workflow(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(workflow)
}

pub async fn workflows_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_workflow(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    deleted(id)
}

pub async fn workflows_execute_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: ExecuteWorkflowParams = EXECUTE_WORKFLOW.parse(&body)?;
    params
        .metadata
        .get_or_insert_with(Default::default)
        .insert("user_id".to_string(), Value::String(user.id.clone()));
    let execution = state
        .vapi
        .execute_workflow(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    tracing::info!(workflow_id = %id, user_id = %user.id, "Workflow executed");
    ok(execution)
}
