//! In-memory alternative to the file download: ask the Data Lab SQL service
//! for the tractor rows inside a cutout and keep them as a [`Table`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use crate::client::truncate_body;
use crate::domain::{BoundingBox, DEFAULT_SIZE, format_coord};
use crate::error::CatalogError;

pub const DEFAULT_QUERY_ENDPOINT: &str = "https://datalab.noirlab.edu/query";
pub const DEFAULT_COLUMNS: &str = "ra, dec";
const TRACTOR_TABLE: &str = "ls_dr9.tractor";
const ANONYMOUS_TOKEN: &str = "anonymous.0.0.anon_access";

pub trait QueryClient: Send + Sync {
    /// Runs `sql` and returns the result set as CSV text with a header row.
    fn query_csv(&self, sql: &str) -> Result<String, CatalogError>;
}

#[derive(Clone)]
pub struct DataLabClient {
    client: Client,
    endpoint: String,
}

impl DataLabClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("skycat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::QueryHttp(err.to_string()))?,
        );
        headers.insert("X-DL-AuthToken", HeaderValue::from_static(ANONYMOUS_TOKEN));
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| CatalogError::QueryHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl QueryClient for DataLabClient {
    fn query_csv(&self, sql: &str) -> Result<String, CatalogError> {
        let url = format!("{}/query", self.endpoint);
        tracing::debug!(%url, sql, "query.request");
        let response = self
            .client
            .get(&url)
            .query(&[("sql", sql), ("ofmt", "csv"), ("async", "false")])
            .send()
            .map_err(|err| CatalogError::QueryHttp(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| CatalogError::QueryHttp(err.to_string()))?;
        if !status.is_success() {
            return Err(CatalogError::QueryStatus {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }
        if body.trim_start().starts_with("Error") {
            return Err(CatalogError::QueryHttp(body.trim().to_string()));
        }
        Ok(body)
    }
}

pub fn sql_for(columns: &str, bbox: &BoundingBox) -> String {
    let columns = match columns.trim() {
        "" => DEFAULT_COLUMNS,
        other => other,
    };
    format!(
        "SELECT {columns} FROM {TRACTOR_TABLE} WHERE ra>{} AND ra<{} AND dec>{} AND dec<{}",
        format_coord(bbox.ra_min),
        format_coord(bbox.ra_max),
        format_coord(bbox.dec_min),
        format_coord(bbox.dec_max)
    )
}

/// Column-named rows kept as text, exactly as the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse_csv(text: &str) -> Result<Self, CatalogError> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| CatalogError::QueryParse("empty result".to_string()))?;
        let columns = split_csv_line(header)?;

        let mut rows = Vec::new();
        for (idx, line) in lines.enumerate() {
            let row = split_csv_line(line)?;
            if row.len() != columns.len() {
                return Err(CatalogError::QueryParse(format!(
                    "row {} has {} fields, expected {}",
                    idx + 1,
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// Runs the cutout query and loads the result into memory. Nothing touches disk.
pub fn sql_catalog<Q: QueryClient>(
    client: &Q,
    ra: f64,
    dec: f64,
    size: Option<f64>,
    columns: &str,
) -> Result<Table, CatalogError> {
    let bbox = BoundingBox::around(ra, dec, size.unwrap_or(DEFAULT_SIZE));
    let sql = sql_for(columns, &bbox);
    let csv = client.query_csv(&sql)?;
    let table = Table::parse_csv(&csv)?;
    tracing::info!(ra, dec, rows = table.len(), "query returned");
    Ok(table)
}

fn split_csv_line(line: &str) -> Result<Vec<String>, CatalogError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return Err(CatalogError::QueryParse(format!("unterminated quote: {line}")));
    }
    fields.push(current);
    Ok(fields.into_iter().map(|field| field.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields() {
        let fields = split_csv_line(r#"1.5,"a, b","say ""hi""""#).unwrap();
        assert_eq!(fields, vec!["1.5", "a, b", r#"say "hi""#]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Table::parse_csv("ra,dec\n1.0\n").unwrap_err();
        assert!(matches!(err, CatalogError::QueryParse(_)));
    }
}
