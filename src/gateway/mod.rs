//! HTTP gateway: webhook ingestion, the authenticated Vapi CRUD proxy and
//! the configurator tool endpoints.

pub mod auth;
pub mod cors;
pub mod handlers;
pub mod pagination;
pub mod schemas;
pub mod server;
pub mod types;
pub mod validation;

pub use self::auth::{
    AuthState, AuthenticatedUser, IdentityProvider, ServiceKeys, StaticIdentity, SupabaseIdentity,
};
pub use self::server::{GatewayState, build_router, start_server};
