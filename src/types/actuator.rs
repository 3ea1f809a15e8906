// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Actuator state types.
//!
//! The irrigation valve is a single relay, so its state is a plain on/off
//! value. The labels used in the change log and on the console are the ones
//! the dashboard of the store already expects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the state of the irrigation relay.
///
/// Serialized as a JSON boolean, matching the `estado` field of the store.
///
/// # Examples
///
/// ```
/// use irrigation_sync::types::ActuatorState;
///
/// let on = ActuatorState::from(true);
/// assert!(on.is_on());
/// assert_eq!(on.event_label(), "Irrigador Ligado");
/// assert_eq!(ActuatorState::Off.console_label(), "DESLIGADO");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ActuatorState {
    /// Relay released, no irrigation.
    #[default]
    Off,
    /// Relay engaged, irrigating.
    On,
}

impl ActuatorState {
    /// Returns `true` when irrigating.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Label written to the `evento` field of a change-log entry.
    #[must_use]
    pub const fn event_label(self) -> &'static str {
        match self {
            Self::On => "Irrigador Ligado",
            Self::Off => "Irrigador Desligado",
        }
    }

    /// Label printed on the console when the relay changes.
    #[must_use]
    pub const fn console_label(self) -> &'static str {
        match self {
            Self::On => "LIGADO",
            Self::Off => "DESLIGADO",
        }
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_on() { "on" } else { "off" })
    }
}

impl From<bool> for ActuatorState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<ActuatorState> for bool {
    fn from(value: ActuatorState) -> Self {
        value.is_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bool() {
        assert_eq!(ActuatorState::from(true), ActuatorState::On);
        assert_eq!(ActuatorState::from(false), ActuatorState::Off);
    }

    #[test]
    fn default_is_off() {
        assert_eq!(ActuatorState::default(), ActuatorState::Off);
    }

    #[test]
    fn serializes_as_bool() {
        assert_eq!(serde_json::to_string(&ActuatorState::On).unwrap(), "true");
        let off: ActuatorState = serde_json::from_str("false").unwrap();
        assert_eq!(off, ActuatorState::Off);
    }

    #[test]
    fn labels() {
        assert_eq!(ActuatorState::On.event_label(), "Irrigador Ligado");
        assert_eq!(ActuatorState::Off.event_label(), "Irrigador Desligado");
        assert_eq!(ActuatorState::On.console_label(), "LIGADO");
    }
}
