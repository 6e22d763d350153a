//! Vapi function (tool definition) CRUD.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};

use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::handlers::creator_stamps;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{CREATE_FUNCTION, UPDATE_FUNCTION};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{FunctionParams, Stamped, VapiFunction};

fn missing(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Fonction avec l'ID {id} non trouvée")
}

pub async fn functions_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<VapiFunction>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_functions(request.list_params()).await?;
    listed(page, request)
}

pub async fn functions_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<VapiFunction>> {
    let function = state
        .vapi
        .get_function(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(function)
}

pub async fn functions_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<VapiFunction>> {
    let mut params: FunctionParams = CREATE_FUNCTION.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    let function = state.vapi.create_function(&params).await?;
    tracing::info!(function_id = %function.id, user_id = %user.id, "Function created");
    created(function)
}

pub async fn functions_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<VapiFunction>> {
    let params: FunctionParams = UPDATE_FUNCTION.parse(&body)?;
    let function = state
        .vapi
        .update_function(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(function)
}

pub async fn functions_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_function(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    tracing::info!(function_id = %id, "Function deleted");
    deleted(id)
}
