//! Backend configuration from environment variables.
//!
//! Native builds read a `.env` file through `dotenvy` and then the process
//! environment. WASM builds have no environment at runtime, so the values are
//! baked in when the crate is compiled.

use reqwest::Url;

pub const DEFAULT_SESSION_KEY: &str = "campusskill-auth-token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid SUPABASE_URL: {0}")]
    InvalidUrl(String),
}

/// Where the hosted backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: String,
    /// Where the magic link should send the user back to.
    pub redirect_to: Option<String>,
    /// Storage key for the persisted session.
    pub session_key: String,
}

impl SupabaseConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_to: None,
            session_key: DEFAULT_SESSION_KEY.to_string(),
        })
    }

    /// Load from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and the optional
    /// `SUPABASE_REDIRECT_URL` / `CAMPUSSKILL_SESSION_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        #[cfg(not(target_arch = "wasm32"))]
        dotenvy::dotenv().ok();

        Self::from_lookup(env_var)
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name| lookup(name).filter(|v| !v.trim().is_empty());

        let url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let anon_key = get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let mut config = Self::new(url.trim(), anon_key.trim())?;
        config.redirect_to = get("SUPABASE_REDIRECT_URL");
        if let Some(key) = get("CAMPUSSKILL_SESSION_KEY") {
            config.session_key = key;
        }
        Ok(config)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_var(name: &'static str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(target_arch = "wasm32")]
fn env_var(name: &'static str) -> Option<String> {
    let value = match name {
        "SUPABASE_URL" => option_env!("SUPABASE_URL"),
        "SUPABASE_ANON_KEY" => option_env!("SUPABASE_ANON_KEY"),
        "SUPABASE_REDIRECT_URL" => option_env!("SUPABASE_REDIRECT_URL"),
        "CAMPUSSKILL_SESSION_KEY" => option_env!("CAMPUSSKILL_SESSION_KEY"),
        _ => None,
    };
    value.map(str::to_string)
}
