//! Router assembly and the HTTP server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ServerError};
use crate::gateway::auth::{AuthState, ServiceKeys, auth_middleware, service_key_middleware};
use crate::gateway::cors::cors_middleware;
use crate::gateway::handlers::{
    assistants::*, configurator::*, functions::*, health::*, messages::*, organization::*,
    squads::*, test_suites::*, webhooks::*, workflows::*,
};
use crate::vapi::VapiClient;
use crate::webhook::{EventHandler, SignatureVerifier};

/// Shared state for all handlers.
pub struct GatewayState {
    /// Vapi REST client for the CRUD proxy and the configurator.
    pub vapi: VapiClient,
    /// Processes inbound webhook events.
    pub events: Arc<dyn EventHandler>,
    /// Checks inbound webhook signatures.
    pub verifier: SignatureVerifier,
    /// Keys accepted on `/configurator-tools/*`.
    pub service_keys: ServiceKeys,
    /// Shutdown signal sender.
    pub shutdown_tx: tokio::sync::RwLock<Option<oneshot::Sender<()>>>,
}

impl GatewayState {
    pub fn new(
        vapi: VapiClient,
        events: Arc<dyn EventHandler>,
        verifier: SignatureVerifier,
        service_keys: ServiceKeys,
    ) -> Self {
        Self {
            vapi,
            events,
            verifier,
            service_keys,
            shutdown_tx: tokio::sync::RwLock::new(None),
        }
    }

    /// Stop a server started with [`start_server`]. Returns false when none
    /// is running.
    pub async fn shutdown(&self) -> bool {
        match self.shutdown_tx.write().await.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

async fn not_found_fallback() -> ApiError {
    ApiError::not_found("Endpoint non trouvé")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub fn build_router(state: Arc<GatewayState>, auth: AuthState) -> Router {
    // Public routes (no auth)
    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/webhooks/receive", post(receive_handler));

    // Internal configurator routes, service key only
    let configurator = Router::new()
        .route(
            "/configurator-tools/analyze-business",
            post(analyze_business_handler),
        )
        .route("/configurator-tools/list-voices", post(list_voices_handler))
        .route(
            "/configurator-tools/create-assistant",
            post(create_assistant_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.service_keys.clone(),
            service_key_middleware,
        ));

    // Protected routes (always require auth)
    let protected = Router::new()
        // Assistants
        .route(
            "/assistants",
            get(assistants_list_handler).post(assistants_create_handler),
        )
        .route(
            "/assistants/{id}",
            get(assistants_get_handler)
                .patch(assistants_update_handler)
                .delete(assistants_delete_handler),
        )
        // Functions
        .route(
            "/functions",
            get(functions_list_handler).post(functions_create_handler),
        )
        .route(
            "/functions/{id}",
            get(functions_get_handler)
                .patch(functions_update_handler)
                .delete(functions_delete_handler),
        )
        // Messages
        .route(
            "/messages/{call_id}",
            get(messages_list_handler).post(messages_create_handler),
        )
        .route(
            "/messages/{call_id}/{message_id}",
            get(messages_get_handler),
        )
        // Test suites
        .route(
            "/test-suites",
            get(test_suites_list_handler).post(test_suites_create_handler),
        )
        .route(
            "/test-suites/{id}",
            get(test_suites_get_handler)
                .patch(test_suites_update_handler)
                .delete(test_suites_delete_handler),
        )
        .route(
            "/test-suite-tests/{suite_id}",
            get(tests_list_handler).post(tests_create_handler),
        )
        .route(
            "/test-suite-tests/{suite_id}/{test_id}",
            get(tests_get_handler)
                .patch(tests_update_handler)
                .delete(tests_delete_handler),
        )
        .route(
            "/test-suite-runs/{suite_id}",
            get(runs_list_handler).post(runs_start_handler),
        )
        .route(
            "/test-suite-runs/{suite_id}/{run_id}",
            get(runs_get_handler)
                .patch(runs_update_handler)
                .delete(runs_delete_handler),
        )
        // Organization
        .route(
            "/organization",
            get(organization_get_handler).patch(organization_update_handler),
        )
        .route("/organization/limits", get(organization_limits_handler))
        // Webhooks
        .route(
            "/webhooks",
            get(webhooks_list_handler).post(webhooks_create_handler),
        )
        .route(
            "/webhooks/{id}",
            get(webhooks_get_handler)
                .patch(webhooks_update_handler)
                .delete(webhooks_delete_handler),
        )
        .route("/webhooks/{id}/ping", post(webhooks_ping_handler))
        // Workflows
        .route(
            "/workflows",
            get(workflows_list_handler).post(workflows_create_handler),
        )
        .route(
            "/workflows/{id}",
            get(workflows_get_handler)
                .patch(workflows_update_handler)
                .delete(workflows_delete_handler),
        )
        .route("/workflows/{id}/execute", post(workflows_execute_handler))
        // Squads
        .route(
            "/squads",
            get(squads_list_handler).post(squads_create_handler),
        )
        .route(
            "/squads/{id}",
            get(squads_get_handler)
                .patch(squads_update_handler)
                .delete(squads_delete_handler),
        )
        .route("/squads/{id}/members", post(squads_add_members_handler))
        .route(
            "/squads/{id}/members/{member_id}",
            delete(squads_remove_member_handler),
        )
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .merge(public)
        .merge(configurator)
        .merge(protected)
        .fallback(not_found_fallback)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Returns the actual bound `SocketAddr` (useful when binding to port 0).
/// Call [`GatewayState::shutdown`] to stop it.
pub async fn start_server(
    addr: SocketAddr,
    state: Arc<GatewayState>,
    auth: AuthState,
) -> Result<SocketAddr, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::StartupFailed {
            addr: addr.to_string(),
            reason: format!("Failed to bind to {}: {}", addr, e),
        })?;
    let bound_addr = listener
        .local_addr()
        .map_err(|e| ServerError::StartupFailed {
            addr: addr.to_string(),
            reason: format!("Failed to get local addr: {}", e),
        })?;

    let app = build_router(state.clone(), auth);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    *state.shutdown_tx.write().await = Some(shutdown_tx);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Gateway shutting down");
            })
            .await
        {
            tracing::error!("Gateway server error: {}", e);
        }
    });

    tracing::info!(addr = %bound_addr, "Gateway listening");
    Ok(bound_addr)
}
