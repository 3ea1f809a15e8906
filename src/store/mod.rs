// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote key-value store access.
//!
//! The node talks to a Firebase Realtime Database style REST API: every
//! location is a JSON value addressed by a slash-delimited path.
//!
//! - [`HttpStore`]: the real store, over HTTPS (`http` feature)
//! - [`MemoryStore`]: in-process fake with failure injection
//!
//! `PUT` overwrites the value at a path, `POST` appends a child under a
//! store-generated key. Any 2xx status is success; anything else surfaces as
//! [`StoreError::Status`].

#[cfg(feature = "http")]
mod http;
mod memory;
mod path;

#[cfg(feature = "http")]
pub use http::{HttpStore, HttpStoreConfig};
pub use memory::{MemoryStore, RecordedRequest};
pub use path::{StoreLayout, StorePath};

use std::fmt;

use serde::Serialize;

use crate::error::StoreError;

/// HTTP method used for a store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreMethod {
    /// Read a value.
    Get,
    /// Overwrite a value.
    Put,
    /// Append a child with a generated key.
    Post,
}

impl StoreMethod {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for StoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful response from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    status: u16,
    body: String,
}

impl StoreResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Trait for stores the synchronization loop can read and write.
///
/// Implementations perform exactly one request per call and never retry;
/// the loop's next tick is the retry.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Reads the value at `path`. A missing value is a successful `null`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport failure or a non-2xx status.
    async fn get(&self, path: &StorePath) -> Result<StoreResponse, StoreError>;

    /// Overwrites the value at `path` with `body`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport failure or a non-2xx status.
    async fn put(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError>;

    /// Appends `body` as a new child of `path` under a generated key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport failure or a non-2xx status.
    async fn post(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError>;

    /// Serializes `value` and writes it with [`put`](Self::put).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialize` if `value` cannot be serialized, or any
    /// error from `put`.
    async fn put_json<T: Serialize + Sync>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<StoreResponse, StoreError> {
        let body = serde_json::to_value(value)?;
        self.put(path, &body).await
    }

    /// Serializes `value` and appends it with [`post`](Self::post).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialize` if `value` cannot be serialized, or any
    /// error from `post`.
    async fn post_json<T: Serialize + Sync>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<StoreResponse, StoreError> {
        let body = serde_json::to_value(value)?;
        self.post(path, &body).await
    }
}

impl<S: RemoteStore> RemoteStore for &S {
    async fn get(&self, path: &StorePath) -> Result<StoreResponse, StoreError> {
        (**self).get(path).await
    }

    async fn put(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError> {
        (**self).put(path, body).await
    }

    async fn post(
        &self,
        path: &StorePath,
        body: &serde_json::Value,
    ) -> Result<StoreResponse, StoreError> {
        (**self).post(path, body).await
    }
}
