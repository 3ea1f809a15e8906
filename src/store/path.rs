// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store paths and the node's path layout.

use std::fmt;

use crate::error::StoreError;

/// A slash-delimited address into the remote store.
///
/// Always starts with `/`, never ends with one, never contains empty
/// segments and carries no `.json` suffix (transports add their own).
///
/// # Examples
///
/// ```
/// use irrigation_sync::store::StorePath;
///
/// let root = StorePath::parse("irrigacao/").unwrap();
/// assert_eq!(root.as_str(), "/irrigacao");
/// assert_eq!(root.join("atuador").join("estado").as_str(), "/irrigacao/atuador/estado");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath(String);

impl StorePath {
    /// Parses a path, normalizing leading/trailing slashes.
    ///
    /// An empty string or `/` is the store root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidAddress`] if a segment is empty or
    /// contains characters the store reserves (`. $ # [ ]`).
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        for segment in trimmed.split('/') {
            Self::validate_segment(segment)
                .map_err(|reason| StoreError::InvalidAddress(format!("{path}: {reason}")))?;
        }

        Ok(Self(format!("/{trimmed}")))
    }

    /// The store root.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Appends one segment.
    ///
    /// Segments are trusted here: this is used with the fixed names of the
    /// layout and with keys generated by the store.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, segment.trim_matches('/')))
    }

    /// Returns the path, `""` for the root.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    fn validate_segment(segment: &str) -> Result<(), &'static str> {
        if segment.is_empty() {
            return Err("empty path segment");
        }
        if segment.contains(['.', '$', '#', '[', ']']) {
            return Err("segment contains a reserved character");
        }
        Ok(())
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The fixed locations the node reads and writes, under a configurable root.
///
/// | path                    | content                                        |
/// |-------------------------|------------------------------------------------|
/// | `<root>/sensor`         | `{ "umidade_percentual": 41.3 }`               |
/// | `<root>/atuador/estado` | `true` / `false`, may be absent                |
/// | `<root>/atuador`        | `{ "estado": true, "ultimo_acionamento_ms": n }` |
/// | `<root>/logs`           | append-only change log                         |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: StorePath,
}

impl StoreLayout {
    /// Default root used by the dashboard.
    pub const DEFAULT_ROOT: &'static str = "/irrigacao";

    /// Creates a layout under `root`.
    #[must_use]
    pub fn new(root: StorePath) -> Self {
        Self { root }
    }

    /// Returns the root path.
    #[must_use]
    pub fn root(&self) -> &StorePath {
        &self.root
    }

    /// Location of the latest humidity reading.
    #[must_use]
    pub fn sensor(&self) -> StorePath {
        self.root.join("sensor")
    }

    /// Location of the actuator object.
    #[must_use]
    pub fn actuator(&self) -> StorePath {
        self.root.join("atuador")
    }

    /// Location of the desired actuator state.
    #[must_use]
    pub fn actuator_state(&self) -> StorePath {
        self.actuator().join("estado")
    }

    /// Location of the change log collection.
    #[must_use]
    pub fn logs(&self) -> StorePath {
        self.root.join("logs")
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self::new(StorePath(Self::DEFAULT_ROOT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_slashes() {
        assert_eq!(StorePath::parse("/a/b/").unwrap().as_str(), "/a/b");
        assert_eq!(StorePath::parse("a").unwrap().as_str(), "/a");
    }

    #[test]
    fn parse_root() {
        assert_eq!(StorePath::parse("/").unwrap(), StorePath::root());
        assert_eq!(StorePath::parse("").unwrap().to_string(), "/");
    }

    #[test]
    fn parse_rejects_empty_segment() {
        assert!(matches!(
            StorePath::parse("/a//b"),
            Err(StoreError::InvalidAddress(_))
        ));
    }

    #[test]
    fn parse_rejects_reserved_characters() {
        assert!(StorePath::parse("/sensor.json").is_err());
        assert!(StorePath::parse("/a/$b").is_err());
    }

    #[test]
    fn segments_skip_root() {
        let path = StorePath::parse("/irrigacao/atuador").unwrap();
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["irrigacao", "atuador"]);
        assert_eq!(StorePath::root().segments().count(), 0);
    }

    #[test]
    fn default_layout_paths() {
        let layout = StoreLayout::default();
        assert_eq!(layout.sensor().as_str(), "/irrigacao/sensor");
        assert_eq!(layout.actuator().as_str(), "/irrigacao/atuador");
        assert_eq!(layout.actuator_state().as_str(), "/irrigacao/atuador/estado");
        assert_eq!(layout.logs().as_str(), "/irrigacao/logs");
    }

    #[test]
    fn layout_at_store_root() {
        let layout = StoreLayout::new(StorePath::root());
        assert_eq!(layout.sensor().as_str(), "/sensor");
    }
}
