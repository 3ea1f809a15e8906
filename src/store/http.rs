// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of the remote store.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{RemoteStore, StoreMethod, StorePath, StoreResponse};

// ============================================================================
// HttpStoreConfig
// ============================================================================

/// Configuration for the HTTP store.
///
/// # Examples
///
/// ```
/// use irrigation_sync::store::HttpStoreConfig;
/// use std::time::Duration;
///
/// let config = HttpStoreConfig::new("my-project-default-rtdb.firebaseio.com")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://my-project-default-rtdb.firebaseio.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStoreConfig {
    host: String,
    #[serde(default = "HttpStoreConfig::default_timeout_ms")]
    timeout_ms: u64,
}

impl HttpStoreConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for `host`.
    ///
    /// `host` may carry a scheme; without one HTTPS is used.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the host as configured.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Creates an [`HttpStore`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_store(self) -> Result<HttpStore, StoreError> {
        HttpStore::new(&self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn default_timeout_ms() -> u64 {
        Self::DEFAULT_TIMEOUT.as_millis() as u64
    }
}

// ============================================================================
// HttpStore
// ============================================================================

/// Remote store reached over HTTP(S).
///
/// Each path maps to `<base_url><path>.json`. The client keeps no idle
/// connections, so every request opens and releases its own connection.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    client: Client,
}

impl HttpStore {
    /// Creates a store client.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn new(config: &HttpStoreConfig) -> Result<Self, StoreError> {
        if config.host().trim().is_empty() {
            return Err(StoreError::InvalidAddress("host is required".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(StoreError::Http)?;

        Ok(Self {
            base_url: config.base_url(),
            client,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for a path.
    fn build_url(&self, path: &StorePath) -> String {
        let mut url = self.base_url.clone();
        for segment in path.segments() {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        if path.segments().next().is_none() {
            url.push('/');
        }
        url.push_str(".json");
        url
    }

    async fn send(
        &self,
        method: StoreMethod,
        path: &StorePath,
        body: Option<&serde_json::Value>,
    ) -> Result<StoreResponse, StoreError> {
        let url = self.build_url(path);

        let request = match method {
            StoreMethod::Get => self.client.get(&url),
            StoreMethod::Put => self.client.put(&url),
            StoreMethod::Post => self.client.post(&url),
        };
        let request = match body {
            // `json` also sets `Content-Type: application/json`.
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "Store request failed");
            StoreError::Http(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                error = %e,
                "Failed to read store response body"
            );
            StoreError::Http(e)
        })?;

        tracing::info!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            body = %text,
            "Store request"
        );

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(StoreResponse::new(status.as_u16(), text))
    }
}

impl RemoteStore for HttpStore {
    async fn get(&self, path: &StorePath) -> Result<StoreResponse, StoreError> {
        self.send(StoreMethod::Get, path, None).await
    }

    async fn put(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError> {
        self.send(StoreMethod::Put, path, Some(body)).await
    }

    async fn post(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError> {
        self.send(StoreMethod::Post, path, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(host: &str) -> HttpStore {
        HttpStoreConfig::new(host).into_store().unwrap()
    }

    #[test]
    fn build_url_appends_json_suffix() {
        let store = store("example.firebaseio.com");
        let path = StorePath::parse("/irrigacao/atuador/estado").unwrap();
        assert_eq!(
            store.build_url(&path),
            "https://example.firebaseio.com/irrigacao/atuador/estado.json"
        );
    }

    #[test]
    fn build_url_encodes_segments() {
        let store = store("http://localhost:9000/");
        let path = StorePath::parse("/jardim norte/sensor").unwrap();
        assert_eq!(
            store.build_url(&path),
            "http://localhost:9000/jardim%20norte/sensor.json"
        );
    }

    #[test]
    fn build_url_for_root() {
        let store = store("example.firebaseio.com");
        assert_eq!(
            store.build_url(&StorePath::root()),
            "https://example.firebaseio.com/.json"
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = HttpStoreConfig::new("  ").into_store();
        assert!(matches!(result, Err(StoreError::InvalidAddress(_))));
    }

    #[test]
    fn config_default_values() {
        let config = HttpStoreConfig::new("example.firebaseio.com");
        assert_eq!(config.host(), "example.firebaseio.com");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_with_timeout() {
        let config = HttpStoreConfig::new("h").with_timeout(Duration::from_millis(2_500));
        assert_eq!(config.timeout(), Duration::from_millis(2_500));
    }

    #[test]
    fn config_base_url_keeps_explicit_scheme() {
        let config = HttpStoreConfig::new("http://127.0.0.1:8080");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn config_deserializes_with_default_timeout() {
        let config: HttpStoreConfig =
            serde_json::from_str(r#"{"host":"example.firebaseio.com"}"#).unwrap();
        assert_eq!(config.timeout(), HttpStoreConfig::DEFAULT_TIMEOUT);
    }
}
