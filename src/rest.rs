use anyhow::{anyhow, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::SupabaseAuth;

/// PostgREST error code for "no rows" on a single-object request.
pub const NO_ROWS: &str = "PGRST116";

/// Who the table requests run as.
#[derive(Clone)]
pub enum Credentials {
    /// A signed-in user; row policies apply
    User(SupabaseAuth),
    /// The admin key; row policies are bypassed
    ServiceRole(String),
}

/// `column=eq.value` query filter.
pub fn eq(column: &str, value: impl ToString) -> (String, String) {
    (column.to_string(), format!("eq.{}", value.to_string()))
}

/// Thin client over the PostgREST table API.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    anon_key: String,
    credentials: Credentials,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str, credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            credentials,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.credentials {
            Credentials::User(auth) => {
                let token = auth.get_access_token().await?;
                req.header("apikey", &self.anon_key).bearer_auth(token)
            }
            Credentials::ServiceRole(key) => req.header("apikey", key).bearer_auth(key),
        })
    }

    async fn check(verb: &str, table: &str, resp: Response) -> Result<Response> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{} {} failed: {} - {}", verb, table, status, body));
        }
        Ok(resp)
    }

    /// `SELECT *` with equality filters and an optional `order` clause such as `date.desc`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(String, String)],
        order: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut req = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filters);
        if let Some(order) = order {
            req = req.query(&[("order", order)]);
        }

        let resp = self.authorize(req).await?.send().await?;
        let rows: Vec<T> = Self::check("SELECT", table, resp).await?.json().await?;
        debug!(table, rows = rows.len(), "select");
        Ok(rows)
    }

    /// Like [`select`](Self::select) but expecting at most one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(String, String)],
    ) -> Result<Option<T>> {
        let mut rows: Vec<T> = self.select(table, filters, None).await?;
        if rows.len() > 1 {
            return Err(anyhow!(
                "SELECT {} returned {} rows, expected at most one",
                table,
                rows.len()
            ));
        }
        Ok(rows.pop())
    }

    pub async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T> {
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body);
        let resp = self.authorize(req).await?.send().await?;
        let resp = Self::check("INSERT", table, resp).await?;
        debug!(table, "insert");
        single(table, resp.json().await?)
    }

    /// Insert or merge on the primary key.
    pub async fn upsert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T> {
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body);
        let resp = self.authorize(req).await?.send().await?;
        let resp = Self::check("UPSERT", table, resp).await?;
        debug!(table, "upsert");
        single(table, resp.json().await?)
    }

    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(String, String)],
        body: &B,
    ) -> Result<T> {
        let req = self
            .client
            .patch(self.table_url(table))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(body);
        let resp = self.authorize(req).await?.send().await?;
        let resp = Self::check("UPDATE", table, resp).await?;
        debug!(table, "update");
        single(table, resp.json().await?)
    }

    pub async fn delete(&self, table: &str, filters: &[(String, String)]) -> Result<()> {
        if filters.is_empty() {
            return Err(anyhow!("DELETE {} refused without a filter", table));
        }
        let req = self.client.delete(self.table_url(table)).query(filters);
        let resp = self.authorize(req).await?.send().await?;
        Self::check("DELETE", table, resp).await?;
        debug!(table, "delete");
        Ok(())
    }

    /// Row count visible to the caller, read from the `Content-Range` header.
    pub async fn count(&self, table: &str) -> Result<u64> {
        let req = self
            .client
            .head(self.table_url(table))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let resp = self.authorize(req).await?.send().await?;
        let resp = Self::check("COUNT", table, resp).await?;

        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("COUNT {} returned no Content-Range", table))?;
        parse_content_range_total(range)
            .ok_or_else(|| anyhow!("COUNT {} returned bad Content-Range: {}", table, range))
    }
}

/// Writes with `return=representation` answer with an array of the affected rows.
fn single<T>(table: &str, mut rows: Vec<T>) -> Result<T> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(anyhow!("{}: no row matched ({})", table, NO_ROWS)),
        n => Err(anyhow!("{}: expected one row, got {}", table, n)),
    }
}

/// Total from a `Content-Range` value like `0-24/3573` or `*/0`.
fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit_once('/')?.1.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_filter() {
        assert_eq!(
            eq("user_id", "abc"),
            ("user_id".to_string(), "eq.abc".to_string())
        );
        assert_eq!(eq("date", "2024-01-07").1, "eq.2024-01-07");
    }

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn single_row_expectations() {
        assert_eq!(single("weights", vec![1]).unwrap(), 1);
        assert!(single::<i32>("weights", vec![])
            .unwrap_err()
            .to_string()
            .contains(NO_ROWS));
        assert!(single("weights", vec![1, 2]).is_err());
    }
}
