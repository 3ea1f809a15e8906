// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable state carried from one loop iteration to the next.

use std::fmt;
use std::time::Duration;

use crate::state::DesiredValue;
use crate::sync::IntervalTimer;
use crate::types::{ActuatorState, Uptime};

/// Where reconciliation stands after the latest desired-state poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReconcilePhase {
    /// Desired and applied state agree.
    #[default]
    Idle,
    /// The store asks for a state that has not been applied yet.
    DesiredDiffers,
    /// The relay is being driven to the desired state.
    Applying,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::DesiredDiffers => f.write_str("desired-differs"),
            Self::Applying => f.write_str("applying"),
        }
    }
}

/// Everything the loop remembers between ticks.
///
/// Created by [`SyncLoop::start`](crate::sync::SyncLoop::start) and passed to
/// every [`tick`](crate::sync::SyncLoop::tick). It only changes inside the
/// loop; callers read it through the accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopState {
    pub(crate) desired: ActuatorState,
    pub(crate) applied: ActuatorState,
    pub(crate) last_desired: Option<DesiredValue>,
    pub(crate) last_transition: Option<Uptime>,
    pub(crate) last_humidity: Option<f32>,
    pub(crate) pin_synced: bool,
    pub(crate) phase: ReconcilePhase,
    pub(crate) sensor_timer: IntervalTimer,
    pub(crate) poll_timer: IntervalTimer,
}

impl LoopState {
    /// Boot state at `now`: everything off, both timers starting now.
    #[must_use]
    pub fn new(now: Uptime, sensor_interval: Duration, poll_interval: Duration) -> Self {
        Self {
            desired: ActuatorState::Off,
            applied: ActuatorState::Off,
            last_desired: None,
            last_transition: None,
            last_humidity: None,
            pin_synced: false,
            phase: ReconcilePhase::Idle,
            sensor_timer: IntervalTimer::new(sensor_interval, now),
            poll_timer: IntervalTimer::new(poll_interval, now),
        }
    }

    /// Latest desired state read from the store (off until the first poll).
    #[must_use]
    pub fn desired(&self) -> ActuatorState {
        self.desired
    }

    /// State the relay was last successfully driven to.
    #[must_use]
    pub fn applied(&self) -> ActuatorState {
        self.applied
    }

    /// Latest decoded store value, `None` until a poll succeeds.
    #[must_use]
    pub fn last_desired(&self) -> Option<DesiredValue> {
        self.last_desired
    }

    /// Uptime of the latest applied transition.
    #[must_use]
    pub fn last_transition(&self) -> Option<Uptime> {
        self.last_transition
    }

    /// Latest valid humidity reading.
    #[must_use]
    pub fn last_humidity(&self) -> Option<f32> {
        self.last_humidity
    }

    /// Whether the pin is known to hold the level for the applied state.
    #[must_use]
    pub fn pin_synced(&self) -> bool {
        self.pin_synced
    }

    /// Current reconciliation phase.
    #[must_use]
    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    /// Returns `true` when desired and applied state agree.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.desired == self.applied
    }

    /// The sensor-publish timer.
    #[must_use]
    pub fn sensor_timer(&self) -> &IntervalTimer {
        &self.sensor_timer
    }

    /// The desired-state poll timer.
    #[must_use]
    pub fn poll_timer(&self) -> &IntervalTimer {
        &self.poll_timer
    }
}
