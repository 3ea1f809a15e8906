// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Documents the node writes to the store.
//!
//! Field names are the ones the dashboard reads, so they stay in Portuguese
//! on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{ActuatorState, Uptime, serialize_one_decimal, serialize_opt_one_decimal};

/// Latest humidity reading, written to `<root>/sensor`.
///
/// ```
/// use irrigation_sync::state::SensorRecord;
///
/// let json = serde_json::to_string(&SensorRecord::new(41.26)).unwrap();
/// assert_eq!(json, r#"{"umidade_percentual":41.3}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Relative humidity in percent, one decimal place on the wire.
    #[serde(rename = "umidade_percentual", serialize_with = "serialize_one_decimal")]
    pub humidity_percent: f32,
}

impl SensorRecord {
    /// Creates a record for a valid reading.
    #[must_use]
    pub fn new(humidity_percent: f32) -> Self {
        Self { humidity_percent }
    }
}

/// Actuator object, written to `<root>/atuador`.
///
/// Overwriting the whole object also rewrites `atuador/estado`, so the
/// desired state the node reads back always matches what it applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorRecord {
    /// Applied state.
    #[serde(rename = "estado")]
    pub state: ActuatorState,
    /// Uptime of the latest transition, omitted when there has been none.
    #[serde(
        rename = "ultimo_acionamento_ms",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition: Option<Uptime>,
}

impl ActuatorRecord {
    /// Record written when the store has no desired state yet.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            state: ActuatorState::Off,
            last_transition: None,
        }
    }

    /// Record for a transition to `state` at `at`.
    #[must_use]
    pub const fn transitioned(state: ActuatorState, at: Uptime) -> Self {
        Self {
            state,
            last_transition: Some(at),
        }
    }
}

/// One entry of the append-only change log at `<root>/logs`.
///
/// # Examples
///
/// ```
/// use irrigation_sync::state::ChangeLogEntry;
/// use irrigation_sync::types::{ActuatorState, Uptime};
/// use std::time::Duration;
///
/// let entry = ChangeLogEntry::new(
///     ActuatorState::On,
///     Uptime::from_millis(120_000),
///     Duration::from_millis(20_000),
///     Some(25.3),
/// );
///
/// assert_eq!(
///     serde_json::to_value(&entry).unwrap(),
///     serde_json::json!({
///         "timestamp_ms": 120000,
///         "evento": "Irrigador Ligado",
///         "duracao_ms": 20000,
///         "umidade": 25.3
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Uptime when the transition was applied.
    pub timestamp_ms: Uptime,
    /// Human-readable event label.
    #[serde(rename = "evento")]
    pub event: String,
    /// Time spent in the previous state, zero for the first transition.
    #[serde(rename = "duracao_ms")]
    pub duration_ms: u64,
    /// Last valid humidity reading, omitted if none was ever taken.
    #[serde(
        rename = "umidade",
        default,
        serialize_with = "serialize_opt_one_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub humidity_percent: Option<f32>,
}

impl ChangeLogEntry {
    /// Creates an entry for a transition into `state`.
    #[must_use]
    pub fn new(
        state: ActuatorState,
        at: Uptime,
        previous_state_lasted: std::time::Duration,
        humidity_percent: Option<f32>,
    ) -> Self {
        Self {
            timestamp_ms: at,
            event: state.event_label().to_string(),
            duration_ms: u64::try_from(previous_state_lasted.as_millis()).unwrap_or(u64::MAX),
            humidity_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn sensor_record_rounds_to_one_decimal() {
        let value = serde_json::to_value(SensorRecord::new(38.04)).unwrap();
        assert_eq!(value, json!({ "umidade_percentual": 38.0 }));
    }

    #[test]
    fn initial_actuator_record() {
        let value = serde_json::to_value(ActuatorRecord::initial()).unwrap();
        assert_eq!(value, json!({ "estado": false }));
    }

    #[test]
    fn transitioned_actuator_record() {
        let record = ActuatorRecord::transitioned(ActuatorState::On, Uptime::from_millis(9_000));
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value, json!({ "estado": true, "ultimo_acionamento_ms": 9000 }));
    }

    #[test]
    fn actuator_record_reads_back() {
        let record: ActuatorRecord = serde_json::from_value(json!({ "estado": true })).unwrap();
        assert_eq!(record.state, ActuatorState::On);
        assert_eq!(record.last_transition, None);
    }

    #[test]
    fn first_transition_entry() {
        let entry = ChangeLogEntry::new(
            ActuatorState::Off,
            Uptime::from_millis(3_000),
            Duration::ZERO,
            None,
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({ "timestamp_ms": 3000, "evento": "Irrigador Desligado", "duracao_ms": 0 })
        );
    }

    #[test]
    fn entry_reads_back() {
        let entry: ChangeLogEntry = serde_json::from_value(json!({
            "timestamp_ms": 5,
            "evento": "Irrigador Ligado",
            "duracao_ms": 1,
            "umidade": 30.5
        }))
        .unwrap();
        assert_eq!(entry.timestamp_ms, Uptime::from_millis(5));
        assert_eq!(entry.humidity_percent, Some(30.5));
    }
}
