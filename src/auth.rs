use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ValidationError;

/// Shortest password accepted when setting a new one.
pub const MIN_PASSWORD_LEN: usize = 6;

/// The auth user as returned by GoTrue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

/// Sign-up answers with a full session when email confirmation is off,
/// and with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
struct SessionState {
    refresh_token: String,
    user: AuthUser,
    token: CachedToken,
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Arc<Mutex<Option<SessionState>>>,
}

impl SupabaseAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Resume from a previously issued refresh token.
    pub async fn with_refresh_token(config: &Config, refresh_token: &str) -> Result<Self> {
        let auth = Self::new(config);
        let token = auth.exchange_refresh_token(refresh_token).await?;
        auth.store(token).await;
        Ok(auth)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Register a new account. Returns the user; a session is stored only if
    /// the project does not require email confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let resp = self
            .client
            .post(self.url("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Sign-up failed: {} - {}", status, body));
        }

        match resp.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => {
                let user = token.user.clone();
                self.store(token).await;
                info!(user_id = %user.id, "signed up with active session");
                Ok(user)
            }
            SignUpResponse::User(user) => {
                info!(user_id = %user.id, "signed up, awaiting email confirmation");
                Ok(user)
            }
        }
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let resp = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Sign-in failed: {} - {}", status, body));
        }

        let token: TokenResponse = resp.json().await?;
        let user = token.user.clone();
        self.store(token).await;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Send a password recovery email that links back to `redirect_to`.
    pub async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url("recover"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Password reset failed: {} - {}", status, body));
        }
        Ok(())
    }

    /// Install the session carried by a recovery link
    /// (`#access_token=..&refresh_token=..&expires_in=..`).
    pub async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<AuthUser> {
        let resp = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Session rejected: {} - {}", status, body));
        }

        let user: AuthUser = resp.json().await?;
        self.store(TokenResponse {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_in,
            user: user.clone(),
        })
        .await;
        info!(user_id = %user.id, "session installed from link");
        Ok(user)
    }

    /// Set a new password for the signed-in user.
    pub async fn update_password(&self, new_password: &str) -> Result<AuthUser> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let token = self.get_access_token().await?;

        let resp = self
            .client
            .put(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Password update failed: {} - {}", status, body));
        }

        let user: AuthUser = resp.json().await?;
        if let Some(state) = self.session.lock().await.as_mut() {
            state.user = user.clone();
        }
        info!(user_id = %user.id, "password updated");
        Ok(user)
    }

    /// Revoke the session server-side and forget it locally.
    pub async fn sign_out(&self) -> Result<()> {
        let token = match self.get_access_token().await {
            Ok(t) => t,
            Err(_) => {
                *self.session.lock().await = None;
                return Ok(());
            }
        };

        let resp = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        *self.session.lock().await = None;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Sign-out failed: {} - {}", status, body));
        }
        Ok(())
    }

    pub async fn get_access_token(&self) -> Result<String> {
        let refresh_token = {
            let session = self.session.lock().await;
            let Some(ref state) = *session else {
                return Err(anyhow!("Not signed in"));
            };
            // Reuse the cached token unless it expires within 60s
            if state.token.expires_at > chrono::Utc::now() + chrono::Duration::seconds(60) {
                return Ok(state.token.access_token.clone());
            }
            state.refresh_token.clone()
        };

        debug!("access token near expiry, refreshing");
        let token = self.exchange_refresh_token(&refresh_token).await?;
        let access_token = token.access_token.clone();
        self.store(token).await;
        Ok(access_token)
    }

    pub async fn user(&self) -> Result<AuthUser> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or_else(|| anyhow!("Not signed in"))
    }

    pub async fn user_id(&self) -> Result<String> {
        Ok(self.user().await?.id)
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let resp = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to refresh token: {} - {}", status, body));
        }

        Ok(resp.json().await?)
    }

    async fn store(&self, token: TokenResponse) {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(token.expires_in);
        *self.session.lock().await = Some(SessionState {
            refresh_token: token.refresh_token,
            user: token.user,
            token: CachedToken {
                access_token: token.access_token,
                expires_at,
            },
        });
    }
}
