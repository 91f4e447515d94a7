//! Row access over the hosted REST layer (`/rest/v1/{table}`).
//!
//! Every request carries the `apikey` header and a bearer token: the
//! signed-in user's access token when there is one, otherwise the anon key.
//! The server enforces row-level rules based on that token.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::{Order, Table};

use crate::config::SupabaseConfig;
use crate::error::{ensure_success, SupabaseError};

const PREFER_INSERT: &str = "return=minimal";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Query string for `select('*')` with an optional ordering.
pub fn select_query(order: Option<Order>) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string())];
    if let Some(order) = order {
        let direction = if order.ascending { "asc" } else { "desc" };
        query.push(("order", format!("{}.{direction}", order.column)));
    }
    query
}

#[derive(Debug, Clone)]
pub struct RestApi {
    http: Client,
    config: SupabaseConfig,
}

impl RestApi {
    pub fn new(http: Client, config: SupabaseConfig) -> Self {
        Self { http, config }
    }

    fn request(&self, method: reqwest::Method, table: Table, bearer: Option<&str>) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.config.rest_url(table.as_str()))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.config.anon_key))
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        order: Option<Order>,
        bearer: Option<&str>,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = self
            .request(reqwest::Method::GET, table, bearer)
            .query(&select_query(order))
            .send()
            .await?;
        let rows = ensure_success(response).await?.json().await?;
        Ok(rows)
    }

    pub async fn insert<T: Serialize>(
        &self,
        table: Table,
        rows: &[T],
        bearer: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let response = self
            .request(reqwest::Method::POST, table, bearer)
            .header("Prefer", PREFER_INSERT)
            .json(rows)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Insert-or-update on the table's primary key.
    pub async fn upsert<T: Serialize>(
        &self,
        table: Table,
        row: &T,
        bearer: Option<&str>,
    ) -> Result<(), SupabaseError> {
        let response = self
            .request(reqwest::Method::POST, table, bearer)
            .header("Prefer", PREFER_UPSERT)
            .json(row)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_query() {
        assert_eq!(select_query(None), vec![("select", "*".to_string())]);
        assert_eq!(
            select_query(Some(Order::desc("created_at"))),
            vec![("select", "*".to_string()), ("order", "created_at.desc".to_string())]
        );
        assert_eq!(select_query(Some(Order::asc("title")))[1].1, "title.asc");
    }
}
