use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::handlers::creator_stamps;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{ADD_SQUAD_MEMBERS, CREATE_SQUAD, UPDATE_SQUAD};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{SquadMember, SquadParams, Stamped};

fn missing(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Squad avec l'ID {id} non trouvée")
}

#[derive(Deserialize)]
struct AddMembers {
    members: Vec<SquadMember>,
}

pub async fn squads_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_squads(request.list_params()).await?;
    listed(page, request)
}

pub async fn squads_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Value>> {
    let squad = state
        .vapi
        .get_squad(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(squad)
}

pub async fn squads_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: SquadParams = CREATE_SQUAD.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    created(state.vapi.create_squad(&params).await?)
}

pub async fn squads_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: SquadParams = UPDATE_SQUAD.parse(&body)?;
    let squad = state
        .vapi
        .update_squad(&id, &params)
        .await
        .map_err(not_found_as(missing(&id)))?;
    ok(squad)
}

pub async fn squads_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_squad(&id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    deleted(id)
}

pub async fn squads_add_members_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let AddMembers { members } = ADD_SQUAD_MEMBERS.parse(&body)?;
    let squad = state
        .vapi
        .add_squad_members(&id, &members)
        .await
        .map_err(not_found_as(missing(&id)))?;
    tracing::info!(squad_id = %id, added = members.len(), "Squad members added");
    ok(squad)
}

pub async fn squads_remove_member_handler(
    State(state): State<Arc<GatewayState>>,
    Path((id, member_id)): Path<(String, String)>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .remove_squad_member(&id, &member_id)
        .await
        .map_err(not_found_as(missing(&id)))?;
    deleted(member_id)
}
