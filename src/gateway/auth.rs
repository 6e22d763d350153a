//! Bearer authentication for the CRUD routes.
//!
//! Tokens are Supabase JWTs, validated by asking the Supabase auth API for
//! the user they belong to. The resolved [`AuthenticatedUser`] is put in the
//! request extensions for handlers to pick up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::SupabaseConfig;
use crate::error::{ApiError, AuthError};

pub const ADMIN_ROLE: &str = "admin";

/// Caller identity, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
    pub role: String,
    pub organization_id: Option<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Organization to stamp on created records; users without one own
    /// their records directly.
    pub fn organization_or_user_id(&self) -> &str {
        self.organization_id.as_deref().unwrap_or(&self.id)
    }
}

pub fn require_admin(user: &AuthenticatedUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::authorization(
            "Accès non autorisé: rôle administrateur requis",
        ))
    }
}

pub fn require_organization(user: &AuthenticatedUser, organization_id: &str) -> Result<(), ApiError> {
    if user.is_admin() || user.organization_id.as_deref() == Some(organization_id) {
        Ok(())
    } else {
        Err(ApiError::authorization(
            "Accès non autorisé à cette organisation",
        ))
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: Option<SupabaseAppMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct SupabaseAppMetadata {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
}

/// Validates tokens against `GET {SUPABASE_URL}/auth/v1/user`.
pub struct SupabaseIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl SupabaseIdentity {
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &SupabaseConfig) -> Self {
        Self::new(&config.url, config.api_key().cloned())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let api_key = self.api_key.as_ref().ok_or(AuthError::NotConfigured)?;
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", api_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::NOT_FOUND
        {
            return Err(AuthError::Rejected);
        }
        if !status.is_success() {
            return Err(AuthError::ProviderUnavailable(format!(
                "auth endpoint returned {status}"
            )));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;
        let metadata = user.app_metadata.unwrap_or_default();
        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
            role: metadata.role.unwrap_or_else(|| "user".to_string()),
            organization_id: metadata.organization_id,
        })
    }
}

/// Fixed token-to-user table, for local development and tests.
#[derive(Default)]
pub struct StaticIdentity {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.users.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.users.get(token).cloned().ok_or(AuthError::Rejected)
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub provider: Arc<dyn IdentityProvider>,
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;
    let (scheme, token) = raw.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }
    Ok(token)
}

pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let user = auth.provider.authenticate(token).await?;
    tracing::debug!(user_id = %user.id, role = %user.role, "Authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Keys accepted on the internal configurator routes.
#[derive(Clone, Default)]
pub struct ServiceKeys {
    keys: Arc<Vec<SecretString>>,
}

impl ServiceKeys {
    pub fn new(keys: impl IntoIterator<Item = SecretString>) -> Self {
        Self {
            keys: Arc::new(keys.into_iter().collect()),
        }
    }

    pub fn from_config(config: &SupabaseConfig) -> Self {
        Self::new(
            [&config.anon_key, &config.service_role_key]
                .into_iter()
                .flatten()
                .cloned(),
        )
    }

    pub fn accepts(&self, token: &str) -> bool {
        self.keys
            .iter()
            .any(|key| bool::from(key.expose_secret().as_bytes().ct_eq(token.as_bytes())))
    }
}

pub async fn service_key_middleware(
    State(keys): State<ServiceKeys>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    if !keys.accepts(token) {
        return Err(ApiError::authentication("Clé de service invalide"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers("bearer  abc ")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            bearer_token(&headers("Basic abc")),
            Err(AuthError::InvalidFormat)
        ));
    }

    #[test]
    fn admin_and_organization_checks() {
        let member = AuthenticatedUser {
            id: "u1".to_string(),
            email: None,
            role: "user".to_string(),
            organization_id: Some("org_1".to_string()),
        };
        assert!(require_admin(&member).is_err());
        assert!(require_organization(&member, "org_1").is_ok());
        assert!(require_organization(&member, "org_2").is_err());

        let admin = AuthenticatedUser {
            role: ADMIN_ROLE.to_string(),
            organization_id: None,
            ..member
        };
        assert!(require_admin(&admin).is_ok());
        assert!(require_organization(&admin, "org_2").is_ok());
        assert_eq!(admin.organization_or_user_id(), "u1");
    }

    #[test]
    fn service_keys_compare_exactly() {
        let keys = ServiceKeys::new([SecretString::from("anon"), SecretString::from("service")]);
        assert!(keys.accepts("anon"));
        assert!(keys.accepts("service"));
        assert!(!keys.accepts("ano"));
        assert!(!ServiceKeys::default().accepts(""));
    }

    #[tokio::test]
    async fn supabase_identity_maps_app_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header_is("apikey", "anon"))
            .and(header_is("authorization", "Bearer jwt-ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "email": "owner@example.fr",
                "app_metadata": { "role": "admin", "organization_id": "org_1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header_is("authorization", "Bearer jwt-bad"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let identity = SupabaseIdentity::new(server.uri(), Some(SecretString::from("anon")));
        let user = identity.authenticate("jwt-ok").await.unwrap();
        assert_eq!(user.role, "admin");
        assert_eq!(user.organization_id.as_deref(), Some("org_1"));
        assert_eq!(user.email.as_deref(), Some("owner@example.fr"));

        assert!(matches!(
            identity.authenticate("jwt-bad").await,
            Err(AuthError::Rejected)
        ));
    }

    #[tokio::test]
    async fn default_role_is_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u2" })))
            .mount(&server)
            .await;

        let identity = SupabaseIdentity::new(server.uri(), Some(SecretString::from("anon")));
        let user = identity.authenticate("jwt").await.unwrap();
        assert_eq!(user.role, "user");
        assert!(user.organization_id.is_none());
    }
}
