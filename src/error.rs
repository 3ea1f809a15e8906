// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the irrigation node.
//!
//! Only configuration errors are ever fatal, and only at startup. Everything
//! that can go wrong inside the control loop (a missing sensor reading, a
//! failed store request, a relay pin that refused a write) is reported through
//! these types, logged by the loop and retried on the next natural tick.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The humidity sensor produced no usable reading.
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// A request to the remote store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The relay output pin could not be driven.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// The node configuration is invalid or could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors produced while acquiring a humidity reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor answered but the value was not a number.
    #[error("sensor returned no reading")]
    NoReading,
}

/// Errors related to remote store communication.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The HTTP request could not be completed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("store answered HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, possibly empty.
        body: String,
    },

    /// The store could not be reached (used by fakes to inject failures).
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store host or root path is malformed.
    #[error("invalid store address: {0}")]
    InvalidAddress(String),

    /// A request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the relay output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The underlying pin driver rejected the write.
    #[error("failed to drive relay pin {level}: {message}")]
    PinWrite {
        /// The level that was requested.
        level: &'static str,
        /// Driver-provided description of the failure.
        message: String,
    },
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that was being read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
