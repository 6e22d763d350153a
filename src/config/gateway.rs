use std::time::Duration;

use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_env, parse_positive_env};
use crate::error::ConfigError;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            host: optional_env("GATEWAY_HOST")?.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env("GATEWAY_PORT", 8787)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Inbound Vapi webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared HMAC secret. Without it only header presence is checked.
    pub secret: Option<SecretString>,
    /// Accepted clock skew on `x-vapi-timestamp`.
    pub tolerance: Duration,
    /// Maximum number of calls kept by the in-memory call ledger.
    pub ledger_capacity: usize,
}

impl WebhookConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let ledger_capacity = parse_env("CALL_LEDGER_CAPACITY", 10_000usize)?;
        if ledger_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CALL_LEDGER_CAPACITY".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            secret: optional_env("VAPI_WEBHOOK_SECRET")?.map(SecretString::from),
            tolerance: Duration::from_secs(parse_positive_env("WEBHOOK_TOLERANCE_SECS", 300)?),
            ledger_capacity,
        })
    }
}
