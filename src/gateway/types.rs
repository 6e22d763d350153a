//! Response envelopes and request extractors shared by the route handlers.

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{ApiError, VapiError};
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::vapi::Page;

/// `{ data }` envelope for single records.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct PingResult {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub type ApiResult<T> = Result<(StatusCode, Json<T>), ApiError>;

pub fn ok<T>(data: T) -> ApiResult<Data<T>> {
    Ok((StatusCode::OK, Json(Data { data })))
}

pub fn created<T>(data: T) -> ApiResult<Data<T>> {
    Ok((StatusCode::CREATED, Json(Data { data })))
}

pub fn deleted(id: impl Into<String>) -> ApiResult<Data<Deleted>> {
    ok(Deleted {
        id: id.into(),
        deleted: true,
    })
}

pub fn listed<T>(page: Page<T>, request: PageRequest) -> ApiResult<Paginated<T>> {
    Ok((StatusCode::OK, Json(Paginated::from_page(page, request))))
}

/// Map an upstream 404 to a resource-specific message; everything else
/// keeps its default mapping.
pub fn not_found_as(message: impl FnOnce() -> String) -> impl FnOnce(VapiError) -> ApiError {
    move |err| {
        if err.is_not_found() {
            ApiError::not_found(message())
        } else {
            err.into()
        }
    }
}

/// JSON body whose rejection is rendered as a validation error envelope.
#[derive(Debug)]
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation("Corps de requête JSON invalide")
                .with_details(json!({ "reason": rejection.body_text() }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mapping_only_touches_404() {
        let missing = VapiError::Status {
            endpoint: "functions/fn_9".to_string(),
            status: 404,
            message: "Not Found".to_string(),
        };
        let err = not_found_as(|| "Fonction avec l'ID fn_9 non trouvée".to_string())(missing);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Fonction avec l'ID fn_9 non trouvée");

        let broken = VapiError::Status {
            endpoint: "functions/fn_9".to_string(),
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        let err = not_found_as(|| unreachable!())(broken);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["error"]["code"], "VAPI_API_ERROR");
    }
}
