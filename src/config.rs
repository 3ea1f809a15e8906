// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node configuration.
//!
//! [`SyncConfig`] holds everything the control loop needs; it can be built in
//! code with the `with_*` methods or deserialized from JSON, where every
//! field is optional and falls back to the defaults below.
//!
//! | field                      | default       |
//! |----------------------------|---------------|
//! | `root`                     | `/irrigacao`  |
//! | `sensor_interval_ms`       | `10000`       |
//! | `poll_interval_ms`         | `3000`        |
//! | `tick_interval_ms`         | `50`          |
//! | `polarity`                 | `active_low`  |
//! | `pin_policy`               | `on_transition` |
//! | `decode_mode`              | `tolerant`    |
//! | `initialize_missing_state` | `true`        |
//! | `change_log`               | `true`        |
//! | `control`                  | `{"mode":"remote"}` |
//!
//! [`NodeConfig`] adds what the `irrigation-node` binary needs around it.

#[cfg(feature = "http")]
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::relay::RelayPolarity;
use crate::state::DecodeMode;
use crate::store::{StoreLayout, StorePath};

/// When the relay pin is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinWritePolicy {
    /// Only when the applied state changes.
    #[default]
    OnTransition,
    /// After every desired-state poll, re-asserting the applied level.
    EveryTick,
}

/// Who decides the desired actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ControlMode {
    /// The store decides; the node only follows `atuador/estado`.
    #[default]
    Remote,
    /// The node decides from its own readings and writes the decision to
    /// `atuador/estado`: irrigate while humidity is below `limit_percent`.
    LocalThreshold {
        /// Humidity below which the node irrigates.
        limit_percent: f32,
    },
}

impl ControlMode {
    /// Default limit for [`ControlMode::LocalThreshold`].
    pub const DEFAULT_LIMIT_PERCENT: f32 = 40.0;

    /// Local threshold mode with the default limit.
    #[must_use]
    pub fn local_threshold() -> Self {
        Self::LocalThreshold {
            limit_percent: Self::DEFAULT_LIMIT_PERCENT,
        }
    }
}

/// Configuration of the synchronization loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use irrigation_sync::config::{PinWritePolicy, SyncConfig};
/// use irrigation_sync::relay::RelayPolarity;
///
/// let config = SyncConfig::new()
///     .with_root("/estufa")
///     .with_poll_interval(Duration::from_secs(1))
///     .with_polarity(RelayPolarity::ActiveHigh)
///     .with_pin_policy(PinWritePolicy::EveryTick);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.layout().unwrap().sensor().as_str(), "/estufa/sensor");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    root: String,
    sensor_interval_ms: u64,
    poll_interval_ms: u64,
    tick_interval_ms: u64,
    polarity: RelayPolarity,
    pin_policy: PinWritePolicy,
    decode_mode: DecodeMode,
    initialize_missing_state: bool,
    change_log: bool,
    control: ControlMode,
}

impl SyncConfig {
    /// Default period of the sensor-publish poll.
    pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_millis(10_000);
    /// Default period of the desired-state poll.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3_000);
    /// Default pause between loop iterations.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
    /// Longest accepted poll period. Wrapping elapsed-time arithmetic on the
    /// 32-bit uptime counter is only unambiguous below half its range.
    pub const MAX_INTERVAL: Duration = Duration::from_millis(u32::MAX as u64 / 2);

    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store root path.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the sensor-publish period.
    #[must_use]
    pub fn with_sensor_interval(mut self, interval: Duration) -> Self {
        self.sensor_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the desired-state poll period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the pause between loop iterations.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the relay polarity.
    #[must_use]
    pub fn with_polarity(mut self, polarity: RelayPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Sets when the relay pin is written.
    #[must_use]
    pub fn with_pin_policy(mut self, policy: PinWritePolicy) -> Self {
        self.pin_policy = policy;
        self
    }

    /// Sets how desired-state payloads are decoded.
    #[must_use]
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Enables or disables writing `{"estado": false}` when the desired
    /// state is absent from the store.
    #[must_use]
    pub fn with_initialize_missing_state(mut self, enabled: bool) -> Self {
        self.initialize_missing_state = enabled;
        self
    }

    /// Enables or disables appending change-log entries.
    #[must_use]
    pub fn with_change_log(mut self, enabled: bool) -> Self {
        self.change_log = enabled;
        self
    }

    /// Sets who decides the desired state.
    #[must_use]
    pub fn with_control(mut self, control: ControlMode) -> Self {
        self.control = control;
        self
    }

    /// Returns the store root as configured.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the sensor-publish period.
    #[must_use]
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_interval_ms)
    }

    /// Returns the desired-state poll period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the pause between loop iterations.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Returns the relay polarity.
    #[must_use]
    pub fn polarity(&self) -> RelayPolarity {
        self.polarity
    }

    /// Returns the pin write policy.
    #[must_use]
    pub fn pin_policy(&self) -> PinWritePolicy {
        self.pin_policy
    }

    /// Returns the desired-state decode mode.
    #[must_use]
    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    /// Returns whether a missing desired state is initialized in the store.
    #[must_use]
    pub fn initialize_missing_state(&self) -> bool {
        self.initialize_missing_state
    }

    /// Returns whether change-log entries are appended.
    #[must_use]
    pub fn change_log(&self) -> bool {
        self.change_log
    }

    /// Returns the control mode.
    #[must_use]
    pub fn control(&self) -> ControlMode {
        self.control
    }

    /// Builds the store layout under the configured root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the root is not a valid store path.
    pub fn layout(&self) -> Result<StoreLayout, ConfigError> {
        StorePath::parse(&self.root)
            .map(StoreLayout::new)
            .map_err(|e| ConfigError::Invalid(format!("root: {e}")))
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, interval) in [
            ("sensor_interval_ms", self.sensor_interval()),
            ("poll_interval_ms", self.poll_interval()),
        ] {
            if interval.is_zero() || interval > Self::MAX_INTERVAL {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 1 and {}",
                    Self::MAX_INTERVAL.as_millis()
                )));
            }
        }

        if let ControlMode::LocalThreshold { limit_percent } = self.control
            && !(0.0..=100.0).contains(&limit_percent)
        {
            return Err(ConfigError::Invalid(format!(
                "limit_percent must be between 0 and 100, got {limit_percent}"
            )));
        }

        self.layout().map(|_| ())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: StoreLayout::DEFAULT_ROOT.to_string(),
            sensor_interval_ms: duration_to_ms(Self::DEFAULT_SENSOR_INTERVAL),
            poll_interval_ms: duration_to_ms(Self::DEFAULT_POLL_INTERVAL),
            tick_interval_ms: duration_to_ms(Self::DEFAULT_TICK_INTERVAL),
            polarity: RelayPolarity::default(),
            pin_policy: PinWritePolicy::default(),
            decode_mode: DecodeMode::default(),
            initialize_missing_state: true,
            change_log: true,
            control: ControlMode::default(),
        }
    }
}

/// Configuration file of the `irrigation-node` binary.
///
/// ```json
/// {
///   "store": { "host": "my-project-default-rtdb.firebaseio.com" },
///   "sync": { "poll_interval_ms": 3000, "polarity": "active_low" },
///   "simulated_humidity": [45.0, 38.5, 31.2]
/// }
/// ```
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Remote store connection.
    pub store: crate::store::HttpStoreConfig,
    /// Loop settings.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Humidity values replayed in a cycle in place of a hardware sensor.
    #[serde(default = "NodeConfig::default_simulated_humidity")]
    pub simulated_humidity: Vec<f32>,
}

#[cfg(feature = "http")]
impl NodeConfig {
    /// Creates a configuration for `host` with default loop settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            store: crate::store::HttpStoreConfig::new(host),
            sync: SyncConfig::default(),
            simulated_humidity: Self::default_simulated_humidity(),
        }
    }

    /// Parses a configuration from JSON text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.sync.validate()?;
        if config.simulated_humidity.is_empty() {
            return Err(ConfigError::Invalid(
                "simulated_humidity must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn default_simulated_humidity() -> Vec<f32> {
        vec![55.0, 48.5, 42.0, 37.5, 33.0, 36.0, 44.5, 51.0]
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.root(), "/irrigacao");
        assert_eq!(config.sensor_interval(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.polarity(), RelayPolarity::ActiveLow);
        assert_eq!(config.pin_policy(), PinWritePolicy::OnTransition);
        assert_eq!(config.decode_mode(), DecodeMode::Tolerant);
        assert!(config.initialize_missing_state());
        assert!(config.change_log());
        assert_eq!(config.control(), ControlMode::Remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let config = SyncConfig::new()
            .with_sensor_interval(Duration::from_secs(30))
            .with_change_log(false)
            .with_initialize_missing_state(false)
            .with_control(ControlMode::local_threshold());

        assert_eq!(config.sensor_interval(), Duration::from_secs(30));
        assert!(!config.change_log());
        assert!(!config.initialize_missing_state());
        assert_eq!(
            config.control(),
            ControlMode::LocalThreshold { limit_percent: 40.0 }
        );
    }

    #[test]
    fn zero_interval_is_invalid() {
        let config = SyncConfig::new().with_poll_interval(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn interval_beyond_half_counter_is_invalid() {
        let config = SyncConfig::new().with_sensor_interval(Duration::from_secs(30 * 24 * 3600));
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_root_is_invalid() {
        let config = SyncConfig::new().with_root("/irrigacao/../x");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn threshold_out_of_range_is_invalid() {
        let config = SyncConfig::new().with_control(ControlMode::LocalThreshold {
            limit_percent: 120.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: SyncConfig = serde_json::from_str(
            r#"{
                "poll_interval_ms": 1000,
                "polarity": "active_high",
                "pin_policy": "every_tick",
                "control": { "mode": "local_threshold", "limit_percent": 35.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.sensor_interval(), Duration::from_secs(10));
        assert_eq!(config.polarity(), RelayPolarity::ActiveHigh);
        assert_eq!(config.pin_policy(), PinWritePolicy::EveryTick);
        assert_eq!(
            config.control(),
            ControlMode::LocalThreshold { limit_percent: 35.0 }
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn node_config_from_json() {
        let config = NodeConfig::from_json(
            r#"{ "store": { "host": "example.firebaseio.com", "timeout_ms": 4000 } }"#,
        )
        .unwrap();
        assert_eq!(config.store.timeout(), Duration::from_secs(4));
        assert_eq!(config.sync, SyncConfig::default());
        assert!(!config.simulated_humidity.is_empty());
    }

    #[cfg(feature = "http")]
    #[test]
    fn node_config_requires_store() {
        let err = NodeConfig::from_json("{}").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[cfg(feature = "http")]
    #[test]
    fn node_config_load_missing_file() {
        let err = NodeConfig::load(Path::new("/nonexistent/irrigation.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
