// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of the desired actuator state read from the store.
//!
//! The dashboard writes `atuador/estado` in several shapes over time: a JSON
//! boolean, a quoted string, or nothing at all. [`DesiredValue::decode`]
//! keeps "not set" apart from "set to false" so the loop can initialize the
//! key, and [`DecodeMode`] chooses how forgiving the parse is.
//!
//! # Examples
//!
//! ```
//! use irrigation_sync::state::{DecodeMode, DesiredValue};
//! use irrigation_sync::types::ActuatorState;
//!
//! let value = DesiredValue::decode("\"true\"", DecodeMode::Tolerant);
//! assert_eq!(value, DesiredValue::True);
//!
//! let value = DesiredValue::decode("null", DecodeMode::Tolerant);
//! assert!(value.is_absent());
//! assert_eq!(value.resolve(), ActuatorState::Off);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ActuatorState;

/// How a desired-state payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Any payload containing the substring `true` means on.
    ///
    /// Accepts `true`, `"true"`, `"True-ish"` and whitespace-padded variants.
    #[default]
    Tolerant,
    /// Only the JSON boolean `true` means on.
    Strict,
}

/// Desired actuator state as found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesiredValue {
    /// The store asks for the actuator to be on.
    True,
    /// The store holds a value that does not mean on.
    False,
    /// The store holds nothing (`null` or an empty body).
    Absent,
}

impl DesiredValue {
    /// Decodes a raw response body.
    #[must_use]
    pub fn decode(payload: &str, mode: DecodeMode) -> Self {
        let payload = payload.trim();
        if payload.is_empty() || payload == "null" {
            return Self::Absent;
        }

        match mode {
            DecodeMode::Tolerant => {
                if payload.contains("true") {
                    Self::True
                } else {
                    Self::False
                }
            }
            DecodeMode::Strict => match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(serde_json::Value::Bool(true)) => Self::True,
                Ok(serde_json::Value::Null) => Self::Absent,
                Ok(_) | Err(_) => Self::False,
            },
        }
    }

    /// Returns `true` if the store held no value.
    #[must_use]
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The actuator state this value asks for. Absent means off.
    #[must_use]
    pub const fn resolve(self) -> ActuatorState {
        match self {
            Self::True => ActuatorState::On,
            Self::False | Self::Absent => ActuatorState::Off,
        }
    }
}

impl fmt::Display for DesiredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tolerant(payload: &str) -> DesiredValue {
        DesiredValue::decode(payload, DecodeMode::Tolerant)
    }

    fn strict(payload: &str) -> DesiredValue {
        DesiredValue::decode(payload, DecodeMode::Strict)
    }

    #[test]
    fn tolerant_true_variants() {
        for payload in ["true", "\"true\"", " true\n", "\"True-ish true\""] {
            assert_eq!(tolerant(payload), DesiredValue::True, "payload {payload:?}");
        }
    }

    #[test]
    fn tolerant_false_variants() {
        for payload in ["false", "\"false\"", "0", "\"TRUE\"", "{}"] {
            assert_eq!(tolerant(payload), DesiredValue::False, "payload {payload:?}");
        }
    }

    #[test]
    fn absent_payloads() {
        for payload in ["", "null", "  null \n", "\n"] {
            assert_eq!(tolerant(payload), DesiredValue::Absent);
            assert_eq!(strict(payload), DesiredValue::Absent);
        }
    }

    #[test]
    fn strict_accepts_only_json_true() {
        assert_eq!(strict("true"), DesiredValue::True);
        assert_eq!(strict(" true "), DesiredValue::True);
        assert_eq!(strict("\"true\""), DesiredValue::False);
        assert_eq!(strict("false"), DesiredValue::False);
        assert_eq!(strict("1"), DesiredValue::False);
        assert_eq!(strict("not json"), DesiredValue::False);
    }

    #[test]
    fn resolve_maps_absent_to_off() {
        assert_eq!(DesiredValue::True.resolve(), ActuatorState::On);
        assert_eq!(DesiredValue::False.resolve(), ActuatorState::Off);
        assert_eq!(DesiredValue::Absent.resolve(), ActuatorState::Off);
        assert!(DesiredValue::Absent.is_absent());
        assert!(!DesiredValue::False.is_absent());
    }

    #[test]
    fn decode_mode_serde() {
        let mode: DecodeMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, DecodeMode::Strict);
        assert_eq!(DecodeMode::default(), DecodeMode::Tolerant);
    }
}
