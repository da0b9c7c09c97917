use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{BoundingBox, format_coord};
use crate::error::CatalogError;

/// Transport for one catalog cutout. Implementations write the response body
/// to `destination` and report how many bytes they wrote.
pub trait CatalogClient: Send + Sync {
    fn download_catalog(&self, bbox: &BoundingBox, destination: &Path)
    -> Result<u64, CatalogError>;
}

#[derive(Clone)]
pub struct LegacySurveyClient {
    client: Client,
    endpoint: String,
}

impl LegacySurveyClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("skycat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn catalog_url(endpoint: &str, bbox: &BoundingBox) -> String {
        format!(
            "{}/cat.fits?ralo={}&rahi={}&declo={}&dechi={}",
            endpoint.trim_end_matches('/'),
            format_coord(bbox.ra_min),
            format_coord(bbox.ra_max),
            format_coord(bbox.dec_min),
            format_coord(bbox.dec_max)
        )
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CatalogError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .map(|body| truncate_body(&body))
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(CatalogError::Status { status, message })
    }
}

impl CatalogClient for LegacySurveyClient {
    fn download_catalog(
        &self,
        bbox: &BoundingBox,
        destination: &Path,
    ) -> Result<u64, CatalogError> {
        let url = Self::catalog_url(&self.endpoint, bbox);
        tracing::debug!(%url, "catalog.request");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        let mut response = Self::handle_status(response)?;
        let mut file =
            File::create(destination).map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| CatalogError::Filesystem(err.to_string()))
    }
}

const MAX_ERROR_BODY: usize = 200;

/// Error pages can be whole HTML documents; keep only the head of them.
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
