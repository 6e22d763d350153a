//! Error types for the AlloKoli gateway.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// Top-level error type for the gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vapi error: {0}")]
    Vapi(#[from] VapiError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the Vapi REST API.
#[derive(Debug, thiserror::Error)]
pub enum VapiError {
    #[error("Erreur API Vapi ({endpoint}): {status} - {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Vapi request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Invalid Vapi response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl VapiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Transport failures, rate limiting and server errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse { .. } => false,
        }
    }
}

/// Bearer authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token d'authentification manquant")]
    MissingToken,

    #[error("Format de token invalide")]
    InvalidFormat,

    #[error("Utilisateur non authentifié")]
    Rejected,

    #[error("Configuration Supabase manquante")]
    NotConfigured,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Function-call tool errors. The display string is returned to the caller
/// verbatim inside `{ "error": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    MissingParameters(String),

    /// Labelled with the configurator endpoint, e.g. `analyze-business`.
    #[error("Erreur {endpoint}: {body}")]
    Upstream { endpoint: String, body: String },

    #[error("Erreur appel {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Erreur appel {tool}: délai de {secs}s dépassé")]
    Timeout { tool: String, secs: u64 },
}

/// Errors raised while applying a webhook event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Call ledger error: {0}")]
    Ledger(String),

    #[error("Invalid {field} payload: {reason}")]
    InvalidPayload { field: &'static str, reason: String },
}

/// Webhook signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("timestamp is not a unix time")]
    InvalidTimestamp,

    #[error("timestamp outside tolerance window ({skew_secs}s skew)")]
    Expired { skew_secs: i64 },

    #[error("signature is not valid hex")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,
}

/// Server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {reason}")]
    StartupFailed { addr: String, reason: String },
}

/// HTTP-facing error kinds, each with a fixed status and wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    MethodNotAllowed,
    Upstream,
    Internal,
}

impl ApiErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::NotFound => "NOT_FOUND_ERROR",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Upstream => "VAPI_API_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by every authenticated route.
///
/// Renders as `{ "error": { "code", "message", "details"? } }` with the
/// status matching its kind.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Authorization, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(ApiErrorKind::MethodNotAllowed, "Méthode non supportée")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn body(&self) -> Value {
        let mut error = json!({
            "code": self.kind.code(),
            "message": self.message,
        });
        if let Some(details) = &self.details {
            error["details"] = details.clone();
        }
        json!({ "error": error })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.kind {
            ApiErrorKind::Upstream | ApiErrorKind::Internal => {
                tracing::error!(code = self.kind.code(), message = %self.message, "Request failed");
            }
            _ => {
                tracing::debug!(code = self.kind.code(), message = %self.message, "Request rejected");
            }
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<VapiError> for ApiError {
    fn from(err: VapiError) -> Self {
        if err.is_not_found() {
            return Self::not_found(err.to_string());
        }
        Self::new(ApiErrorKind::Upstream, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidFormat | AuthError::Rejected => {
                Self::authentication(err.to_string())
            }
            AuthError::NotConfigured => Self::internal(err.to_string()),
            AuthError::ProviderUnavailable(reason) => {
                tracing::warn!(%reason, "Identity provider call failed");
                Self::internal("Une erreur interne est survenue")
            }
        }
    }
}

/// Result type alias for the gateway.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_vapi_errors() {
        let not_found: ApiError = VapiError::Status {
            endpoint: "functions/fn_1".to_string(),
            status: 404,
            message: "Not Found".to_string(),
        }
        .into();
        assert_eq!(not_found.kind, ApiErrorKind::NotFound);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_gateway: ApiError = VapiError::Status {
            endpoint: "functions".to_string(),
            status: 502,
            message: "upstream down".to_string(),
        }
        .into();
        assert_eq!(bad_gateway.kind, ApiErrorKind::Upstream);
        assert_eq!(bad_gateway.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            bad_gateway.message,
            "Erreur API Vapi (functions): 502 - upstream down"
        );
    }

    #[test]
    fn maps_auth_errors() {
        let missing: ApiError = AuthError::MissingToken.into();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.message, "Token d'authentification manquant");

        let unavailable: ApiError = AuthError::ProviderUnavailable("dns".to_string()).into();
        assert_eq!(unavailable.kind, ApiErrorKind::Internal);
        assert!(!unavailable.message.contains("dns"));
    }

    #[test]
    fn envelope_includes_details_only_when_present() {
        let plain = ApiError::not_found("Fonction avec l'ID fn_1 non trouvée").body();
        assert_eq!(plain["error"]["code"], "NOT_FOUND_ERROR");
        assert!(plain["error"].get("details").is_none());

        let detailed = ApiError::validation("Validation des données échouée")
            .with_details(json!({ "errors": { "name": "trop court" } }))
            .body();
        assert_eq!(detailed["error"]["details"]["errors"]["name"], "trop court");
    }

    #[test]
    fn retryable_statuses() {
        let status = |status| VapiError::Status {
            endpoint: "x".to_string(),
            status,
            message: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(
            VapiError::Transport {
                endpoint: "x".to_string(),
                reason: "reset".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn tool_error_messages_are_caller_facing() {
        let err = ToolError::Upstream {
            endpoint: "analyze-business".to_string(),
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Erreur analyze-business: boom");
    }
}
