use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use super::{DataStore, Filter, Table};
use crate::error::{Result, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Rows per upsert request.
const UPSERT_CHUNK: usize = 500;
/// Rows per select page; matches the default PostgREST `max-rows`.
const SELECT_PAGE: usize = 1000;

/// Supabase / PostgREST table API.
pub struct PostgrestStore {
    client: Client,
    rest_url: Url,
    key: String,
}

impl PostgrestStore {
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(url)
            .map_err(|e| SyncError::Config(format!("invalid store url {url:?}: {e}")))?;
        let rest_url = base
            .join("rest/v1/")
            .map_err(|e| SyncError::Config(format!("invalid store url {url:?}: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Store(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            rest_url,
            key: key.into(),
        })
    }

    fn table_url(&self, table: Table) -> Result<Url> {
        self.rest_url
            .join(table.name())
            .map_err(|e| SyncError::Store(format!("{}: {e}", table.name())))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

/// Send and turn non-2xx responses into store errors carrying the body.
fn send(table: Table, builder: RequestBuilder) -> Result<reqwest::blocking::Response> {
    let resp = builder
        .send()
        .map_err(|e| SyncError::Store(format!("{}: {e}", table.name())))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(SyncError::Store(format!(
            "{}: API error ({status}): {body}",
            table.name()
        )));
    }
    Ok(resp)
}

/// PostgREST `order` clause over the table's conflict key, so paging with
/// `offset` is stable.
fn order_clause(table: Table) -> String {
    table
        .conflict_columns()
        .iter()
        .map(|c| format!("{c}.asc"))
        .collect::<Vec<_>>()
        .join(",")
}

fn select_query(table: Table, columns: &str, filters: &[Filter<'_>], offset: usize) -> Vec<(String, String)> {
    let mut query = vec![
        ("select".to_string(), columns.to_string()),
        ("order".to_string(), order_clause(table)),
        ("limit".to_string(), SELECT_PAGE.to_string()),
        ("offset".to_string(), offset.to_string()),
    ];
    query.extend(
        filters
            .iter()
            .map(|f| (f.column.to_string(), format!("eq.{}", f.value))),
    );
    query
}

impl DataStore for PostgrestStore {
    fn select(&self, table: Table, columns: &str, filters: &[Filter<'_>]) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        let mut rows = Vec::new();
        loop {
            let query = select_query(table, columns, filters, rows.len());
            let resp = send(
                table,
                self.authorized(self.client.get(url.clone())).query(&query),
            )?;
            let page: Vec<Value> = resp
                .json()
                .map_err(|e| SyncError::Store(format!("{}: bad response: {e}", table.name())))?;
            let last_page = page.len() < SELECT_PAGE;
            rows.extend(page);
            if last_page {
                break;
            }
        }
        log::debug!("{}: selected {} row(s)", table.name(), rows.len());
        Ok(rows)
    }

    fn upsert(&self, table: Table, rows: &[Value]) -> Result<()> {
        let url = self.table_url(table)?;
        let on_conflict = table.conflict_columns().join(",");
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let request = self
                .authorized(self.client.post(url.clone()))
                .query(&[("on_conflict", on_conflict.as_str())])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(chunk);
            send(table, request)?;
            log::debug!("{}: upserted {} row(s)", table.name(), chunk.len());
        }
        Ok(())
    }
}
