// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What a single loop iteration did.

use crate::error::RelayError;
use crate::state::{ChangeLogEntry, DesiredValue};
use crate::types::{ActuatorState, HumidityReading, Uptime};

/// Outcome of one [`SyncLoop::tick`](crate::sync::SyncLoop::tick).
///
/// Both fields are `None` on the many ticks where no timer fired.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Uptime at the start of the tick.
    pub at: Uptime,
    /// Set when the sensor timer fired.
    pub sensor: Option<SensorOutcome>,
    /// Set when the desired-state poll timer fired.
    pub poll: Option<PollOutcome>,
}

impl TickReport {
    pub(crate) fn new(at: Uptime) -> Self {
        Self {
            at,
            sensor: None,
            poll: None,
        }
    }

    /// Returns `true` if no timer fired.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.sensor.is_none() && self.poll.is_none()
    }

    /// The transition applied during this tick, if any.
    #[must_use]
    pub fn transition(&self) -> Option<&Transition> {
        self.poll.as_ref().and_then(|p| p.transition.as_ref())
    }
}

/// Result of a sensor read and publish.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorOutcome {
    /// What the sensor returned.
    pub reading: HumidityReading,
    /// Whether the reading reached the store. Always `false` for an invalid
    /// reading, which is never sent.
    pub published: bool,
    /// State decided locally from the reading, in local threshold mode.
    pub decided: Option<ActuatorState>,
}

/// Result of a desired-state poll and the reconciliation that followed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollOutcome {
    /// Decoded store value, `None` if the read failed.
    pub desired: Option<DesiredValue>,
    /// Whether the missing desired state was written as `false`.
    pub initialized: bool,
    /// Whether the relay pin was written.
    pub pin_written: bool,
    /// Pin driver error, if a write was attempted and failed.
    pub pin_error: Option<RelayError>,
    /// The transition applied, if the applied state changed.
    pub transition: Option<Transition>,
}

/// An applied state change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State before.
    pub from: ActuatorState,
    /// State after.
    pub to: ActuatorState,
    /// The change-log entry describing it.
    pub entry: ChangeLogEntry,
    /// Whether the entry was appended to the store.
    pub log_written: bool,
    /// Whether the actuator object was updated in the store.
    pub actuator_written: bool,
}
