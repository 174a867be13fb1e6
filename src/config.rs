use anyhow::{anyhow, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Connection settings for the Supabase project backing MassLog.
#[derive(Clone, Debug)]
pub struct Config {
    /// Project URL without trailing slash
    pub supabase_url: String,
    pub anon_key: String,
    /// Admin key; only the server needs it
    pub service_role_key: Option<String>,
    pub bind_addr: String,
}

impl Config {
    pub fn new(supabase_url: &str, anon_key: &str) -> Self {
        Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    pub fn with_service_role_key(mut self, key: &str) -> Self {
        self.service_role_key = Some(key.to_string());
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read settings through `get` so tests need not touch the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} missing", key))
        };
        let url = required("SUPABASE_URL")?;
        let anon_key = required("SUPABASE_ANON_KEY")?;

        let mut config = Self::new(&url, &anon_key);
        config.service_role_key = get("SUPABASE_SERVICE_ROLE_KEY").filter(|v| !v.is_empty());
        if let Some(addr) = get("MASSLOG_BIND_ADDR") {
            config.bind_addr = addr;
        }
        Ok(config)
    }

    pub fn require_service_role_key(&self) -> Result<&str> {
        self.service_role_key
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_SERVICE_ROLE_KEY missing"))
    }
}
