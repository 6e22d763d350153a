//! Wiring from a resolved [`Config`] to the gateway's shared state.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::gateway::{AuthState, GatewayState, ServiceKeys, SupabaseIdentity};
use crate::tools::{ToolRegistry, ToolsClient, configurator_tools};
use crate::vapi::VapiClient;
use crate::webhook::{EventDispatcher, MemoryCallLedger, SignatureVerifier};

/// Everything `start_server` needs.
pub struct Components {
    pub state: Arc<GatewayState>,
    pub auth: AuthState,
}

pub fn build_components(config: &Config) -> Result<Components, Error> {
    let vapi = VapiClient::from_config(&config.vapi)?;

    let tools = ToolRegistry::new(config.tools.timeout)
        .with_tools(configurator_tools(ToolsClient::from_config(&config.tools)));
    tracing::debug!(tools = ?tools.names(), "Function-call tools registered");

    let ledger = Arc::new(MemoryCallLedger::new(config.webhook.ledger_capacity));
    let events = Arc::new(EventDispatcher::new(ledger, Arc::new(tools)));

    let verifier = SignatureVerifier::new(config.webhook.secret.clone(), config.webhook.tolerance);
    if !verifier.is_hmac() {
        tracing::warn!(
            "VAPI_WEBHOOK_SECRET is not set; webhook deliveries are only checked for signature headers"
        );
    }

    let state = Arc::new(GatewayState::new(
        vapi,
        events,
        verifier,
        ServiceKeys::from_config(&config.supabase),
    ));
    let auth = AuthState {
        provider: Arc::new(SupabaseIdentity::from_config(&config.supabase)),
    };

    Ok(Components { state, auth })
}
