use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{AuthUser, SupabaseAuth};
use crate::config::Config;
use crate::error::ValidationError;
use crate::models::*;
use crate::rest::{eq, Credentials, RestClient};
use crate::stats::{dashboard_stats, find_by_date};
use crate::weekly::weekly_buckets;

const WEIGHTS: &str = "weights";
const PROFILES: &str = "user_profiles";

/// Everything the dashboard shows, computed from one fetch.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub weights: Vec<WeightSample>,
    pub profile: Option<UserProfile>,
    pub stats: DashboardStats,
    pub weeks: Vec<WeekBucket<WeightSample>>,
}

/// A signed-in MassLog user talking to Supabase.
#[derive(Clone)]
pub struct MassLogClient {
    pub auth: SupabaseAuth,
    pub rest: RestClient,
}

impl MassLogClient {
    fn from_auth(config: &Config, auth: SupabaseAuth) -> Self {
        let rest = RestClient::new(
            &config.supabase_url,
            &config.anon_key,
            Credentials::User(auth.clone()),
        );
        Self { auth, rest }
    }

    /// Sign in with email and password.
    pub async fn login(config: &Config, email: &str, password: &str) -> Result<Self> {
        let auth = SupabaseAuth::new(config);
        auth.sign_in_with_password(email, password).await?;
        Ok(Self::from_auth(config, auth))
    }

    /// Resume a session from a stored refresh token.
    pub async fn resume(config: &Config, refresh_token: &str) -> Result<Self> {
        let auth = SupabaseAuth::with_refresh_token(config, refresh_token).await?;
        Ok(Self::from_auth(config, auth))
    }

    /// Pick up the session from a password recovery link.
    pub async fn from_recovery_link(
        config: &Config,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<Self> {
        let auth = SupabaseAuth::new(config);
        auth.set_session(access_token, refresh_token, expires_in).await?;
        Ok(Self::from_auth(config, auth))
    }

    /// Register an account. The profile row is created by the database trigger.
    pub async fn sign_up(config: &Config, email: &str, password: &str) -> Result<AuthUser> {
        SupabaseAuth::new(config).sign_up(email, password).await
    }

    pub async fn reset_password(config: &Config, email: &str, redirect_to: &str) -> Result<()> {
        SupabaseAuth::new(config)
            .reset_password_for_email(email, redirect_to)
            .await
    }

    pub async fn update_password(&self, new_password: &str) -> Result<AuthUser> {
        self.auth.update_password(new_password).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }

    pub async fn user_id(&self) -> Result<String> {
        self.auth.user_id().await
    }

    /// All weights of the user, newest first.
    pub async fn get_weights(&self) -> Result<Vec<WeightSample>> {
        let uid = self.user_id().await?;
        self.rest
            .select(WEIGHTS, &[eq("user_id", &uid)], Some("date.desc"))
            .await
    }

    pub async fn get_weight_by_date(&self, date: NaiveDate) -> Result<Option<WeightSample>> {
        let uid = self.user_id().await?;
        self.rest
            .select_one(WEIGHTS, &[eq("user_id", &uid), eq("date", date)])
            .await
    }

    /// Record a new weight. Fails with [`ValidationError::DuplicateDate`] if
    /// that day already has one.
    pub async fn add_weight(&self, entry: NewWeight) -> Result<WeightSample> {
        self.save_weight(entry, false).await
    }

    /// Record a weight, replacing the value of an existing same-day entry
    /// when `overwrite` is set.
    pub async fn save_weight(&self, entry: NewWeight, overwrite: bool) -> Result<WeightSample> {
        entry.validate()?;

        if let Some(existing) = self.get_weight_by_date(entry.date).await? {
            if !overwrite {
                return Err(ValidationError::DuplicateDate(entry.date).into());
            }
            info!(date = %entry.date, "overwriting existing weight");
            return self.update_weight(&existing.id, entry.value).await;
        }

        let uid = self.user_id().await?;
        let sample: WeightSample = self
            .rest
            .insert(
                WEIGHTS,
                &json!({ "user_id": uid, "date": entry.date, "value": entry.value }),
            )
            .await?;
        info!(date = %sample.date, "weight recorded");
        Ok(sample)
    }

    /// Change the value of a weight. Date and id stay as they are.
    pub async fn update_weight(&self, id: &str, value_kg: f64) -> Result<WeightSample> {
        check_weight_range("weight", value_kg)?;
        self.rest
            .update(WEIGHTS, &[eq("id", id)], &json!({ "value": value_kg }))
            .await
    }

    pub async fn delete_weight(&self, id: &str) -> Result<()> {
        self.rest.delete(WEIGHTS, &[eq("id", id)]).await
    }

    /// The user's profile, or `None` if the row does not exist yet.
    pub async fn get_profile(&self) -> Result<Option<UserProfile>> {
        let uid = self.user_id().await?;
        self.rest.select_one(PROFILES, &[eq("id", &uid)]).await
    }

    pub async fn set_goal_weight(&self, goal_kg: Option<f64>) -> Result<UserProfile> {
        if let Some(goal) = goal_kg {
            check_weight_range("goal weight", goal)?;
        }
        let uid = self.user_id().await?;
        self.rest
            .upsert(PROFILES, &json!({ "id": uid, "goal_weight": goal_kg }))
            .await
    }

    pub async fn set_total_change_start_date(
        &self,
        start: Option<NaiveDate>,
    ) -> Result<UserProfile> {
        let uid = self.user_id().await?;
        self.rest
            .upsert(
                PROFILES,
                &json!({ "id": uid, "total_change_start_date": start }),
            )
            .await
    }

    /// Fetch weights and profile and derive the dashboard as of `today`.
    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let weights = self.get_weights().await?;
        let profile = self.get_profile().await?;

        let goal = profile.as_ref().and_then(|p| p.goal_weight);
        let start = profile.as_ref().and_then(|p| p.total_change_start_date);
        if let Some(start) = start {
            if find_by_date(&weights, start).is_none() {
                warn!(%start, "no weight recorded on total change start date");
            }
        }

        let stats = dashboard_stats(&weights, goal, start, today)
            .context("stored weights failed validation")?;
        let weeks = weekly_buckets(&weights)?;
        Ok(Dashboard {
            weights,
            profile,
            stats,
            weeks,
        })
    }

    /// Cheap round trip proving the project and key are reachable.
    pub async fn check_connection(&self) -> Result<u64> {
        self.rest.count(PROFILES).await
    }
}
