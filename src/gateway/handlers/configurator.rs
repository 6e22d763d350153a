//! `/configurator-tools/*` endpoints, called with a service key by the
//! webhook function-call tools. Responses are bare JSON objects.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::configurator::{self, AssistantRequest, Sector};
use crate::error::ApiError;
use crate::gateway::server::GatewayState;
use crate::gateway::types::JsonBody;

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub async fn analyze_business_handler(JsonBody(body): JsonBody) -> Result<Json<Value>, ApiError> {
    let description = non_empty_str(&body, "description")
        .ok_or_else(|| ApiError::validation("Description business requise"))?;

    let analysis = configurator::analyze_business(description);
    tracing::debug!(
        sector = %analysis.sector,
        confidence = analysis.confidence,
        "Business analysed"
    );
    Ok(Json(json!({
        "recommendations": {
            "template": analysis.recommended_template,
            "confidence": analysis.confidence,
            "detected_sector": analysis.sector,
            "business_size": analysis.size,
        },
        "analysis": analysis,
    })))
}

pub async fn list_voices_handler(JsonBody(body): JsonBody) -> Result<Json<Value>, ApiError> {
    let sector = non_empty_str(&body, "sector").ok_or_else(|| ApiError::validation("Secteur requis"))?;
    let language = non_empty_str(&body, "language").unwrap_or("fr");
    let business_name = non_empty_str(&body, "businessName");

    let recommendations =
        configurator::recommend_voices(Sector::parse_or_default(sector), language, business_name);
    Ok(Json(json!({
        "sector": sector,
        "language": language,
        "total_voices": recommendations.total(),
        "recommendations": recommendations,
    })))
}

pub async fn create_assistant_handler(
    State(state): State<Arc<GatewayState>>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let incomplete =
        || ApiError::validation("Configuration incomplète: businessName, sector et selectedVoice requis");
    if non_empty_str(&body, "businessName").is_none()
        || non_empty_str(&body, "sector").is_none()
        || !body.get("selectedVoice").is_some_and(Value::is_object)
    {
        return Err(incomplete());
    }
    let request: AssistantRequest = serde_json::from_value(body).map_err(|e| {
        incomplete().with_details(json!({ "reason": e.to_string() }))
    })?;

    let created = configurator::create_complete_assistant(&state.vapi, &request).await?;
    Ok(Json(json!(created)))
}
