//! Database API client
//!
//! Speaks a PostgREST-style interface: filters are query parameters like
//! `status=eq.published`, writes ask for `return=representation`, and the
//! authenticated principal rides along as a bearer token.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::auth::SessionStore;
use super::RestApi;
use crate::error::{AppError, Result};

/// Query parameters for a database API request
///
/// Built fluently by the resource gateways; encodes the PostgREST filter
/// grammar so gateways never concatenate URLs by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns (and embedded relations) to return,
    /// e.g. `"*, author:profiles(*)"`
    pub fn select(mut self, columns: &str) -> Self {
        self.pairs.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter: `column=eq.value`
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.pairs
            .push((column.to_string(), format!("eq.{}", value.into())));
        self
    }

    /// Null filter: `column=is.null`
    pub fn is_null(mut self, column: &str) -> Self {
        self.pairs.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// Not-null filter: `column=not.is.null`
    pub fn not_null(mut self, column: &str) -> Self {
        self.pairs
            .push((column.to_string(), "not.is.null".to_string()));
        self
    }

    /// Array containment filter: `column=cs.{value}`
    pub fn contains(mut self, column: &str, value: impl Into<String>) -> Self {
        self.pairs
            .push((column.to_string(), format!("cs.{{{}}}", value.into())));
        self
    }

    /// Sort order for the result set
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.pairs
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.pairs.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.pairs.push(("offset".to_string(), offset.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Live database API client
pub struct RemoteRest {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    session: SessionStore,
}

impl RemoteRest {
    pub fn new(http: reqwest::Client, base: Url, anon_key: String, session: SessionStore) -> Self {
        Self {
            http,
            base,
            anon_key,
            session,
        }
    }

    fn table_url(&self, table: &str, query: &Query) -> Result<Url> {
        let mut url = self
            .base
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| AppError::Backend(format!("Invalid table path: {}", e)))?;
        url.query_pairs_mut().extend_pairs(query.pairs().iter());
        Ok(url)
    }

    /// Bearer token for the request: the live session token when present,
    /// the anon key otherwise
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) if !session.is_expired() => session.access_token.clone(),
            _ => self.anon_key.clone(),
        }
    }

    async fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    /// Surface a non-2xx response as a backend rejection carrying the
    /// service's own message
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend(extract_error_message(&body, status)))
    }
}

/// Pull the human-readable message out of a structured error body,
/// falling back to the raw body, then the status code
pub(crate) fn extract_error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(field).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    format!("Request failed with status {}", status)
}

#[async_trait]
impl RestApi for RemoteRest {
    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>> {
        let url = self.table_url(table, &query)?;
        let request = self.authed(self.http.get(url)).await;
        let response = Self::check(request.send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, body: Value) -> Result<Value> {
        let url = self.table_url(table, &Query::new())?;
        let request = self
            .authed(self.http.post(url))
            .await
            .header("Prefer", "return=representation")
            .json(&body);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(AppError::Backend(
                "Insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn upsert(&self, table: &str, body: Value, on_conflict: &str) -> Result<Value> {
        let mut url = self.table_url(table, &Query::new())?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);
        let request = self
            .authed(self.http.post(url))
            .await
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&body);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(AppError::Backend(
                "Upsert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, table: &str, query: Query, body: Value) -> Result<Value> {
        let url = self.table_url(table, &query)?;
        let request = self
            .authed(self.http.patch(url))
            .await
            .header("Prefer", "return=representation")
            .json(&body);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(AppError::Backend(
                "Update matched no rows".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, table: &str, query: Query) -> Result<()> {
        let url = self.table_url(table, &query)?;
        let request = self.authed(self.http.delete(url)).await;
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        let url = self
            .base
            .join(&format!("rest/v1/rpc/{}", function))
            .map_err(|e| AppError::Backend(format!("Invalid function path: {}", e)))?;
        let request = self.authed(self.http.post(url)).await.json(&args);
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_grammar() {
        let query = Query::new()
            .select("*, author:profiles(*)")
            .eq("status", "published")
            .contains("tags", "rust")
            .is_null("parent_id")
            .order("created_at", false)
            .limit(10)
            .offset(20);

        assert_eq!(
            query.pairs(),
            &[
                ("select".to_string(), "*, author:profiles(*)".to_string()),
                ("status".to_string(), "eq.published".to_string()),
                ("tags".to_string(), "cs.{rust}".to_string()),
                ("parent_id".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("offset".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_error_message_prefers_structured_fields() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(r#"{"message":"duplicate key"}"#, status),
            "duplicate key"
        );
        assert_eq!(
            extract_error_message(r#"{"error_description":"Invalid login credentials"}"#, status),
            "Invalid login credentials"
        );
        assert_eq!(extract_error_message("plain failure", status), "plain failure");
        assert_eq!(
            extract_error_message("", status),
            "Request failed with status 400 Bad Request"
        );
    }
}
