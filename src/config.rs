use std::env;

use crate::error::{Error, Result};

pub const ENDPOINT_VAR: &str = "SUPABASE_URL";
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Resolved connection settings for the remote store. Built once at startup
/// and passed into the client explicitly; no module-level state.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| env::var(name).ok())
    }

    /// Resolve settings from an arbitrary variable lookup. The service role
    /// key is preferred over the anon key when both are present. Credential
    /// correctness is not checked here; bad keys surface on first use.
    pub fn resolve(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = present(get(ENDPOINT_VAR))
            .ok_or_else(|| Error::Config(format!("{ENDPOINT_VAR} is not set")))?;

        let api_key = present(get(SERVICE_KEY_VAR))
            .or_else(|| present(get(ANON_KEY_VAR)))
            .ok_or_else(|| {
                Error::Config(format!(
                    "neither {SERVICE_KEY_VAR} nor {ANON_KEY_VAR} is set"
                ))
            })?;

        Ok(StoreConfig { endpoint, api_key })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
