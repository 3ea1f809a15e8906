// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory remote store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{RemoteStore, StoreMethod, StorePath, StoreResponse};

/// One request seen by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// The request method.
    pub method: StoreMethod,
    /// The addressed path.
    pub path: String,
    /// The body, for writes.
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Inner {
    tree: Value,
    requests: Vec<RecordedRequest>,
    raw_bodies: HashMap<String, String>,
    failing: HashMap<String, u16>,
    offline: bool,
    next_key: u64,
}

impl Inner {
    fn node(&self, path: &StorePath) -> Option<&Value> {
        path.segments()
            .try_fold(&self.tree, |node, segment| node.get(segment))
    }

    fn node_mut(&mut self, path: &StorePath) -> &mut Value {
        let mut node = &mut self.tree;
        for segment in path.segments() {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                node = map.entry(segment).or_insert(Value::Null);
            }
        }
        node
    }

    /// Removes nulls left behind by writes so that "absent" stays absent.
    fn prune(value: &mut Value) {
        if let Value::Object(map) = value {
            map.values_mut().for_each(Self::prune);
            map.retain(|_, v| !v.is_null() && !matches!(v, Value::Object(m) if m.is_empty()));
        }
    }

    fn check(&self, path: &StorePath) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unreachable("store is offline".to_string()));
        }
        if let Some(status) = self.failing.get(path.as_str()) {
            return Err(StoreError::Status {
                status: *status,
                body: r#"{"error":"injected failure"}"#.to_string(),
            });
        }
        Ok(())
    }
}

/// Remote store kept in process memory.
///
/// Behaves like the Firebase REST API for the operations the node uses:
/// missing paths read as `null`, `PUT` replaces a subtree (creating parents),
/// `POST` appends a child under a fresh key and answers `{"name": key}`.
/// Generated keys sort in insertion order.
///
/// Clones share the same data, so a test can keep a handle for assertions
/// while the loop owns another. Failures can be injected per path or for
/// the whole store, and a raw body can be pinned to a path to simulate
/// unusual serializations.
///
/// # Examples
///
/// ```
/// use irrigation_sync::store::{MemoryStore, RemoteStore, StorePath};
///
/// # async fn example() -> Result<(), irrigation_sync::error::StoreError> {
/// let store = MemoryStore::new();
/// let path = StorePath::parse("/irrigacao/atuador").unwrap();
///
/// store.put(&path, &serde_json::json!({ "estado": true })).await?;
/// let state = store.get(&path.join("estado")).await?;
/// assert_eq!(state.body(), "true");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `tree`.
    #[must_use]
    pub fn with_tree(tree: Value) -> Self {
        let store = Self::new();
        store.inner.lock().tree = tree;
        store
    }

    /// Returns the value at `path`, `None` if absent.
    #[must_use]
    pub fn value(&self, path: &StorePath) -> Option<Value> {
        self.inner.lock().node(path).cloned()
    }

    /// Sets the value at `path` without recording a request.
    pub fn set_value(&self, path: &StorePath, value: Value) {
        let mut inner = self.inner.lock();
        *inner.node_mut(path) = value;
        Inner::prune(&mut inner.tree);
    }

    /// Removes the value at `path`.
    pub fn remove(&self, path: &StorePath) {
        self.set_value(path, Value::Null);
    }

    /// Children of the object at `path`, in key order.
    #[must_use]
    pub fn children(&self, path: &StorePath) -> Vec<Value> {
        match self.value(path) {
            Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
            _ => Vec::new(),
        }
    }

    /// Makes `GET` on `path` answer `body` verbatim.
    pub fn set_raw_body(&self, path: &StorePath, body: impl Into<String>) {
        self.inner
            .lock()
            .raw_bodies
            .insert(path.as_str().to_string(), body.into());
    }

    /// Makes every request on exactly `path` fail with `status`.
    pub fn fail_path(&self, path: &StorePath, status: u16) {
        self.inner
            .lock()
            .failing
            .insert(path.as_str().to_string(), status);
    }

    /// Clears failures injected with [`fail_path`](Self::fail_path).
    pub fn clear_failures(&self) {
        self.inner.lock().failing.clear();
    }

    /// Makes every request fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// All requests received so far, including failed ones.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().requests.clone()
    }

    /// Requests received for `method` on `path`.
    #[must_use]
    pub fn requests_to(&self, method: StoreMethod, path: &StorePath) -> Vec<RecordedRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path.as_str())
            .cloned()
            .collect()
    }

    /// Forgets recorded requests.
    pub fn clear_requests(&self) {
        self.inner.lock().requests.clear();
    }

    fn record(
        &self,
        method: StoreMethod,
        path: &StorePath,
        body: Option<&Value>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.requests.push(RecordedRequest {
            method,
            path: path.as_str().to_string(),
            body: body.cloned(),
        });
        let result = inner.check(path);
        if let Err(e) = &result {
            tracing::debug!(method = %method, path = %path, error = %e, "Memory store request failed");
        } else {
            tracing::debug!(method = %method, path = %path, "Memory store request");
        }
        result
    }
}

impl RemoteStore for MemoryStore {
    async fn get(&self, path: &StorePath) -> Result<StoreResponse, StoreError> {
        self.record(StoreMethod::Get, path, None)?;

        let inner = self.inner.lock();
        if let Some(raw) = inner.raw_bodies.get(path.as_str()) {
            return Ok(StoreResponse::new(200, raw.clone()));
        }
        let body = inner.node(path).unwrap_or(&Value::Null).to_string();
        Ok(StoreResponse::new(200, body))
    }

    async fn put(&self, path: &StorePath, body: &Value) -> Result<StoreResponse, StoreError> {
        self.record(StoreMethod::Put, path, Some(body))?;

        let mut inner = self.inner.lock();
        inner.raw_bodies.remove(path.as_str());
        *inner.node_mut(path) = body.clone();
        Inner::prune(&mut inner.tree);
        Ok(StoreResponse::new(200, body.to_string()))
    }

    async fn post(&self, path: &StorePath, body: &Value) -> Result<StoreResponse, StoreError> {
        self.record(StoreMethod::Post, path, Some(body))?;

        let mut inner = self.inner.lock();
        let seq = inner.next_key;
        inner.next_key += 1;
        let key = format!("-{seq:012}{}", &Uuid::new_v4().simple().to_string()[..8]);

        *inner.node_mut(&path.join(&key)) = body.clone();
        Ok(StoreResponse::new(
            200,
            serde_json::json!({ "name": key }).to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn missing_value_reads_null() {
        let store = MemoryStore::new();
        let response = store.get(&path("/irrigacao/atuador/estado")).await.unwrap();
        assert_eq!(response.body(), "null");
    }

    #[tokio::test]
    async fn put_creates_parents_and_is_readable_below() {
        let store = MemoryStore::new();
        store
            .put(&path("/irrigacao/atuador"), &json!({ "estado": false }))
            .await
            .unwrap();

        let response = store.get(&path("/irrigacao/atuador/estado")).await.unwrap();
        assert_eq!(response.body(), "false");
    }

    #[tokio::test]
    async fn put_overwrites_whole_subtree() {
        let store = MemoryStore::new();
        let actuator = path("/a");
        store
            .put(&actuator, &json!({ "estado": true, "ultimo_acionamento_ms": 5 }))
            .await
            .unwrap();
        store.put(&actuator, &json!({ "estado": false })).await.unwrap();

        assert_eq!(store.value(&actuator), Some(json!({ "estado": false })));
    }

    #[tokio::test]
    async fn post_appends_in_order() {
        let store = MemoryStore::new();
        let logs = path("/logs");
        for i in 0..3 {
            let response = store.post(&logs, &json!({ "i": i })).await.unwrap();
            let name: Value = response.parse().unwrap();
            assert!(name["name"].as_str().unwrap().starts_with('-'));
        }

        assert_eq!(
            store.children(&logs),
            vec![json!({ "i": 0 }), json!({ "i": 1 }), json!({ "i": 2 })]
        );
    }

    #[tokio::test]
    async fn failing_path_returns_status_error() {
        let store = MemoryStore::new();
        let sensor = path("/sensor");
        store.fail_path(&sensor, 503);

        let err = store.put(&sensor, &json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 503, .. }));
        assert_eq!(store.value(&sensor), None);
        assert_eq!(store.requests().len(), 1);

        store.clear_failures();
        store.put(&sensor, &json!(1)).await.unwrap();
        assert_eq!(store.value(&sensor), Some(json!(1)));
    }

    #[tokio::test]
    async fn offline_store_is_unreachable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store.get(&path("/x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn raw_body_overrides_get() {
        let store = MemoryStore::new();
        let estado = path("/atuador/estado");
        store.set_raw_body(&estado, " \"true\"\n");
        assert_eq!(store.get(&estado).await.unwrap().body(), " \"true\"\n");

        store.put(&estado, &json!(false)).await.unwrap();
        assert_eq!(store.get(&estado).await.unwrap().body(), "false");
    }

    #[tokio::test]
    async fn remove_makes_value_absent() {
        let store = MemoryStore::with_tree(json!({ "a": { "b": 1 } }));
        store.remove(&path("/a/b"));
        assert_eq!(store.value(&path("/a")), None);
    }

    #[tokio::test]
    async fn clones_share_data() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.put(&path("/k"), &json!("v")).await.unwrap();
        assert_eq!(handle.value(&path("/k")), Some(json!("v")));
        assert_eq!(handle.requests_to(StoreMethod::Put, &path("/k")).len(), 1);
    }
}
