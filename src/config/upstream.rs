use std::time::Duration;

use secrecy::SecretString;

use crate::config::helpers::{
    first_non_empty_env, normalize_base_url, optional_env, parse_env, parse_positive_env,
    required_env,
};
use crate::error::ConfigError;

pub const DEFAULT_VAPI_BASE_URL: &str = "https://api.vapi.ai";

/// Supabase identity provider settings.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: Option<SecretString>,
    pub service_role_key: Option<SecretString>,
}

impl SupabaseConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let raw = required_env("SUPABASE_URL", "Set it to your Supabase project URL")?;
        let anon_key = optional_env("SUPABASE_ANON_KEY")?.map(SecretString::from);
        let service_role_key = optional_env("SUPABASE_SERVICE_ROLE_KEY")?.map(SecretString::from);
        if anon_key.is_none() && service_role_key.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "SUPABASE_ANON_KEY".to_string(),
                hint: "Set SUPABASE_ANON_KEY or SUPABASE_SERVICE_ROLE_KEY".to_string(),
            });
        }
        Ok(Self {
            url: normalize_base_url("SUPABASE_URL", &raw)?,
            anon_key,
            service_role_key,
        })
    }

    /// Key sent as `apikey` to the auth endpoint. Anon key wins when both are set.
    pub fn api_key(&self) -> Option<&SecretString> {
        self.anon_key.as_ref().or(self.service_role_key.as_ref())
    }
}

/// Vapi REST client settings.
#[derive(Debug, Clone)]
pub struct VapiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
}

impl VapiConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let api_key = required_env("VAPI_API_KEY", "Create a private key in the Vapi dashboard")?;
        let base_url = optional_env("VAPI_BASE_URL")?
            .unwrap_or_else(|| DEFAULT_VAPI_BASE_URL.to_string());
        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: normalize_base_url("VAPI_BASE_URL", &base_url)?,
            timeout: Duration::from_secs(parse_positive_env("VAPI_TIMEOUT_SECS", 30)?),
            max_retries: parse_env("VAPI_MAX_RETRIES", 3)?,
            retry_base: Duration::from_millis(parse_env("VAPI_RETRY_BASE_MS", 200)?),
        })
    }
}

/// Configurator tool forwarding settings for `function-call` events.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub base_url: String,
    pub bearer: Option<SecretString>,
    pub timeout: Duration,
}

impl ToolsConfig {
    pub(crate) fn resolve(supabase: &SupabaseConfig) -> Result<Self, ConfigError> {
        let base_url = match optional_env("CONFIGURATOR_TOOLS_URL")? {
            Some(url) => normalize_base_url("CONFIGURATOR_TOOLS_URL", &url)?,
            None => format!("{}/functions/v1/configurator-tools", supabase.url),
        };
        Ok(Self {
            base_url,
            bearer: first_non_empty_env(&["SUPABASE_ANON_KEY", "SUPABASE_SERVICE_ROLE_KEY"])?
                .map(SecretString::from),
            timeout: Duration::from_secs(parse_positive_env("TOOL_TIMEOUT_SECS", 5)?),
        })
    }
}
