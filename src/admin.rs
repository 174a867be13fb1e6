use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::rest::{eq, Credentials, RestClient};

/// Privileged operations run with the service role key. Server side only.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
    service_role_key: String,
    rest: RestClient,
}

impl AdminClient {
    pub fn new(config: &Config) -> Result<Self> {
        let key = config.require_service_role_key()?.to_string();
        Ok(Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            rest: RestClient::new(
                &config.supabase_url,
                &config.anon_key,
                Credentials::ServiceRole(key.clone()),
            ),
            service_role_key: key,
        })
    }

    /// Remove a user and everything they own.
    ///
    /// Row deletions are best effort; only the auth user deletion decides
    /// the outcome.
    pub async fn delete_account(&self, user_id: &str) -> Result<()> {
        if let Err(e) = self.rest.delete("weights", &[eq("user_id", user_id)]).await {
            warn!(user_id, error = %e, "failed to delete weights");
        }
        if let Err(e) = self.rest.delete("user_profiles", &[eq("id", user_id)]).await {
            warn!(user_id, error = %e, "failed to delete profile");
        }

        self.delete_user(user_id).await?;
        info!(user_id, "account deleted");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);
        let resp = self
            .client
            .delete(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Delete user {} failed: {} - {}", user_id, status, body));
        }
        Ok(())
    }
}
