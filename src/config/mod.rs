//! Configuration for the AlloKoli gateway.
//!
//! Everything comes from environment variables. A `.env` file in the working
//! directory is loaded first via dotenvy; real env vars take precedence over
//! it. Secrets are wrapped in `SecretString` and never printed.

mod gateway;
pub(crate) mod helpers;
mod upstream;

use secrecy::ExposeSecret;

use crate::error::ConfigError;

pub use self::gateway::{GatewayConfig, WebhookConfig};
pub use self::upstream::{DEFAULT_VAPI_BASE_URL, SupabaseConfig, ToolsConfig, VapiConfig};

/// Main configuration for the gateway.
#[derive(Debug, Clone)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub supabase: SupabaseConfig,
    pub vapi: VapiConfig,
    pub webhook: WebhookConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load `.env` (if any) and resolve every section from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::resolve()
    }

    /// Resolve from the current process environment without touching `.env`.
    pub fn resolve() -> Result<Self, ConfigError> {
        let supabase = SupabaseConfig::resolve()?;
        let tools = ToolsConfig::resolve(&supabase)?;
        Ok(Self {
            gateway: GatewayConfig::resolve()?,
            vapi: VapiConfig::resolve()?,
            webhook: WebhookConfig::resolve()?,
            supabase,
            tools,
        })
    }

    /// Human-readable summary with secrets redacted.
    pub fn redacted_summary(&self) -> Vec<(&'static str, String)> {
        fn mask(secret: Option<&secrecy::SecretString>) -> String {
            match secret {
                Some(value) => {
                    let len = value.expose_secret().len();
                    format!("set ({len} chars)")
                }
                None => "unset".to_string(),
            }
        }

        vec![
            ("bind", self.gateway.bind_addr()),
            ("supabase.url", self.supabase.url.clone()),
            ("supabase.anon_key", mask(self.supabase.anon_key.as_ref())),
            (
                "supabase.service_role_key",
                mask(self.supabase.service_role_key.as_ref()),
            ),
            ("vapi.base_url", self.vapi.base_url.clone()),
            ("vapi.api_key", mask(Some(&self.vapi.api_key))),
            ("vapi.timeout", format!("{}s", self.vapi.timeout.as_secs())),
            ("vapi.max_retries", self.vapi.max_retries.to_string()),
            (
                "vapi.retry_base",
                format!("{}ms", self.vapi.retry_base.as_millis()),
            ),
            ("webhook.secret", mask(self.webhook.secret.as_ref())),
            (
                "webhook.tolerance",
                format!("{}s", self.webhook.tolerance.as_secs()),
            ),
            (
                "webhook.ledger_capacity",
                self.webhook.ledger_capacity.to_string(),
            ),
            ("tools.base_url", self.tools.base_url.clone()),
            ("tools.timeout", format!("{}s", self.tools.timeout.as_secs())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "GATEWAY_HOST",
        "GATEWAY_PORT",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
        "SUPABASE_SERVICE_ROLE_KEY",
        "VAPI_API_KEY",
        "VAPI_BASE_URL",
        "VAPI_TIMEOUT_SECS",
        "VAPI_MAX_RETRIES",
        "VAPI_RETRY_BASE_MS",
        "VAPI_WEBHOOK_SECRET",
        "WEBHOOK_TOLERANCE_SECS",
        "CONFIGURATOR_TOOLS_URL",
        "TOOL_TIMEOUT_SECS",
        "CALL_LEDGER_CAPACITY",
    ];

    fn reset_env(vars: &[(&str, &str)]) {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            for key in KEYS {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("SUPABASE_URL", "https://project.supabase.co/"),
        ("SUPABASE_ANON_KEY", "anon-key"),
        ("VAPI_API_KEY", "vapi-key"),
    ];

    #[test]
    fn resolves_defaults_from_minimal_env() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        reset_env(MINIMAL);

        let config = Config::resolve().expect("resolve");
        assert_eq!(config.gateway.bind_addr(), "0.0.0.0:8787");
        assert_eq!(config.supabase.url, "https://project.supabase.co");
        assert_eq!(config.vapi.base_url, DEFAULT_VAPI_BASE_URL);
        assert_eq!(config.vapi.timeout, Duration::from_secs(30));
        assert_eq!(config.vapi.max_retries, 3);
        assert!(config.webhook.secret.is_none());
        assert_eq!(config.webhook.tolerance, Duration::from_secs(300));
        assert_eq!(config.tools.timeout, Duration::from_secs(5));
        assert_eq!(
            config.tools.base_url,
            "https://project.supabase.co/functions/v1/configurator-tools"
        );
        assert_eq!(
            config.tools.bearer.as_ref().map(|s| s.expose_secret().to_string()),
            Some("anon-key".to_string())
        );
    }

    #[test]
    fn missing_vapi_key_is_reported() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        reset_env(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon-key"),
        ]);

        let err = Config::resolve().expect_err("should fail");
        assert!(
            matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "VAPI_API_KEY")
        );
    }

    #[test]
    fn service_role_key_satisfies_supabase_requirement() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        reset_env(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("VAPI_API_KEY", "vapi-key"),
        ]);

        let config = Config::resolve().expect("resolve");
        assert!(config.supabase.anon_key.is_none());
        assert_eq!(
            config.supabase.api_key().map(|s| s.expose_secret().to_string()),
            Some("service-key".to_string())
        );
    }

    #[test]
    fn rejects_zero_timeouts_and_bad_numbers() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let mut vars = MINIMAL.to_vec();
        vars.push(("TOOL_TIMEOUT_SECS", "0"));
        reset_env(&vars);
        let err = Config::resolve().expect_err("zero timeout");
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TOOL_TIMEOUT_SECS")
        );

        let mut vars = MINIMAL.to_vec();
        vars.push(("GATEWAY_PORT", "eighty"));
        reset_env(&vars);
        let err = Config::resolve().expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "GATEWAY_PORT"));
    }

    #[test]
    fn rejects_non_http_base_urls() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let mut vars = MINIMAL.to_vec();
        vars.push(("VAPI_BASE_URL", "ftp://api.vapi.ai"));
        reset_env(&vars);

        let err = Config::resolve().expect_err("bad scheme");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "VAPI_BASE_URL"));
    }

    #[test]
    fn summary_never_contains_secrets() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let mut vars = MINIMAL.to_vec();
        vars.push(("VAPI_WEBHOOK_SECRET", "whsec_topsecret"));
        reset_env(&vars);

        let config = Config::resolve().expect("resolve");
        let rendered: String = config
            .redacted_summary()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();
        assert!(!rendered.contains("whsec_topsecret"));
        assert!(!rendered.contains("vapi-key"));
        assert!(rendered.contains("webhook.secret=set (15 chars)"));
    }
}
