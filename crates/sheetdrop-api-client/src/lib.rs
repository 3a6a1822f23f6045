//! HTTP client for the SheetDrop upload endpoint.
//!
//! [`ApiClient`] owns the reqwest client and base URL; [`Transport`] is the seam
//! callers use to submit a validated [`FileDescriptor`](sheetdrop_core::FileDescriptor).

pub mod transport;

use anyhow::{Context, Result};
use reqwest::Client;
use sheetdrop_core::constants::DEFAULT_UPLOAD_ROUTE;
use std::time::Duration;

pub use transport::{Transport, TransportError};

const DEFAULT_API_URL: &str = "http://localhost:4000";

/// HTTP client for the upload endpoint.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    upload_route: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_route: DEFAULT_UPLOAD_ROUTE.to_string(),
        })
    }

    /// Create client from environment: SHEETDROP_API_URL (or API_URL) and
    /// SHEETDROP_UPLOAD_ROUTE.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SHEETDROP_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let client = Self::new(base_url)?;
        match std::env::var("SHEETDROP_UPLOAD_ROUTE") {
            Ok(route) => client.with_upload_route(route),
            Err(_) => Ok(client),
        }
    }

    pub fn with_upload_route(mut self, route: impl Into<String>) -> Result<Self> {
        let route = route.into();
        if !route.starts_with('/') {
            return Err(anyhow::anyhow!(
                "Upload route must start with '/': {}",
                route
            ));
        }
        self.upload_route = route;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_route(&self) -> &str {
        &self.upload_route
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
