//! Record store backed by a PostgREST-compatible HTTP endpoint.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DepartmentRecord, FacultyRecord},
    error::{ReadFailure, StoreErrorBody},
    query::{escape_like, FacultyQuery},
};
use tracing::debug;
use url::Url;

use super::RecordStore;
use crate::config::StoreEndpoint;

const REST_PREFIX: &str = "rest/v1/";
const FACULTY_TABLE: &str = "faculty";
const DEPARTMENT_TABLE: &str = "department";
const FACULTY_SELECT: &str = "*,department:department_id(department_name)";

pub struct PostgrestStore {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(endpoint: StoreEndpoint) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(endpoint.request_timeout)
            .build()
            .context("failed to build store http client")?;
        Ok(Self::with_client(http, endpoint.base_url, endpoint.api_key))
    }

    pub fn with_client(http: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    async fn read_table<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ReadFailure> {
        let url = self
            .base_url
            .join(&format!("{REST_PREFIX}{table}"))
            .map_err(|err| ReadFailure::Transport(format!("invalid table url: {err}")))?;

        let response = self
            .http
            .get(url)
            .query(params)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ReadFailure::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ReadFailure::Transport(err.to_string()))?;
        debug!(table, status = status.as_u16(), bytes = body.len(), "store: read settled");

        if !status.is_success() {
            let body = serde_json::from_slice::<StoreErrorBody>(&body).unwrap_or_else(|_| {
                StoreErrorBody::new(String::from_utf8_lossy(&body).trim().to_string())
            });
            return Err(ReadFailure::Store {
                status: Some(status.as_u16()),
                body,
            });
        }

        let rows: Option<Vec<T>> = serde_json::from_slice(&body)
            .map_err(|err| ReadFailure::Malformed(format!("{table}: {err}")))?;
        Ok(rows.unwrap_or_default())
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn query_faculty(&self, query: &FacultyQuery) -> Result<Vec<FacultyRecord>, ReadFailure> {
        self.read_table(FACULTY_TABLE, &faculty_params(query)).await
    }

    async fn query_departments(&self) -> Result<Vec<DepartmentRecord>, ReadFailure> {
        let params = [
            ("select", "*".to_string()),
            ("order", "department_name.asc".to_string()),
        ];
        self.read_table(DEPARTMENT_TABLE, &params).await
    }
}

pub(crate) fn faculty_params(query: &FacultyQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", FACULTY_SELECT.to_string()),
        ("order", "name.asc".to_string()),
    ];
    match query {
        FacultyQuery::All => {}
        FacultyQuery::Search { term } => {
            let pattern = quote_filter_value(&format!("*{}*", escape_like(term)));
            params.push((
                "or",
                format!(
                    "(name.ilike.{pattern},email.ilike.{pattern},designation.ilike.{pattern})"
                ),
            ));
        }
        FacultyQuery::Department(department_id) => {
            params.push(("department_id", format!("eq.{department_id}")));
        }
    }
    params
}

/// Double-quotes a logic-tree operand so commas, dots and parentheses in the
/// term cannot break the `or=(...)` expression.
fn quote_filter_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
#[path = "../tests/postgrest_tests.rs"]
mod tests;
