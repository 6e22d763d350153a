use std::sync::Arc;

use axum::Extension;
use axum::extract::State;
use serde_json::Value;

use crate::gateway::auth::{AuthenticatedUser, require_admin};
use crate::gateway::schemas::UPDATE_ORGANIZATION;
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::OrganizationParams;

pub async fn organization_get_handler(
    State(state): State<Arc<GatewayState>>,
) -> ApiResult<Data<Value>> {
    ok(state.vapi.get_organization().await?)
}

pub async fn organization_update_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    require_admin(&user)?;
    let params: OrganizationParams = UPDATE_ORGANIZATION.parse(&body)?;
    let organization = state.vapi.update_organization(&params).await?;
    tracing::info!(user_id = %user.id, "Organization updated");
    ok(organization)
}

pub async fn organization_limits_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Data<Value>> {
    require_admin(&user)?;
    ok(state.vapi.get_organization_limits().await?)
}
