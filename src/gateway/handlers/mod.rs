//! Route handlers, one module per resource.

pub mod assistants;
pub mod configurator;
pub mod functions;
pub mod health;
pub mod messages;
pub mod organization;
pub mod squads;
pub mod test_suites;
pub mod webhooks;
pub mod workflows;

use crate::gateway::auth::AuthenticatedUser;

/// `metadata.user_id` / `metadata.organization_id` stamps for created records.
pub(crate) fn creator_stamps(user: &AuthenticatedUser) -> [(&str, &str); 2] {
    [
        ("user_id", user.id.as_str()),
        ("organization_id", user.organization_or_user_id()),
    ]
}
