// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay output.
//!
//! [`Relay`] wraps any `embedded-hal` [`OutputPin`] and maps an
//! [`ActuatorState`] to an electrical level according to the configured
//! [`RelayPolarity`]. Polarity is configuration, never inferred at runtime.
//!
//! # Examples
//!
//! ```
//! use irrigation_sync::relay::{PinLevel, RecordingPin, Relay, RelayPolarity};
//! use irrigation_sync::types::ActuatorState;
//!
//! let mut relay = Relay::new(RecordingPin::new(), RelayPolarity::ActiveLow);
//! relay.drive(ActuatorState::On).unwrap();
//! assert_eq!(relay.pin().level(), Some(PinLevel::Low));
//! ```

use std::convert::Infallible;
use std::fmt;

use embedded_hal::digital::{ErrorType, OutputPin};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::types::ActuatorState;

/// Electrical level of the relay pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinLevel {
    /// Logic low.
    Low,
    /// Logic high.
    High,
}

impl PinLevel {
    /// Returns the level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for PinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which level engages the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPolarity {
    /// Low engages the relay (the common opto-isolated modules).
    #[default]
    ActiveLow,
    /// High engages the relay.
    ActiveHigh,
}

impl RelayPolarity {
    /// Returns the pin level that represents `state`.
    #[must_use]
    pub const fn level_for(self, state: ActuatorState) -> PinLevel {
        match (self, state) {
            (Self::ActiveLow, ActuatorState::On) | (Self::ActiveHigh, ActuatorState::Off) => {
                PinLevel::Low
            }
            (Self::ActiveLow, ActuatorState::Off) | (Self::ActiveHigh, ActuatorState::On) => {
                PinLevel::High
            }
        }
    }
}

/// A relay driven through a digital output pin.
#[derive(Debug)]
pub struct Relay<P> {
    pin: P,
    polarity: RelayPolarity,
    writes: u64,
}

impl<P: OutputPin> Relay<P> {
    /// Wraps `pin`. Nothing is written until [`drive`](Self::drive) is called.
    pub fn new(pin: P, polarity: RelayPolarity) -> Self {
        Self {
            pin,
            polarity,
            writes: 0,
        }
    }

    /// Sets the pin to the level representing `state`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PinWrite`] if the pin driver rejects the write.
    pub fn drive(&mut self, state: ActuatorState) -> Result<PinLevel, RelayError> {
        let level = self.polarity.level_for(state);
        let result = match level {
            PinLevel::Low => self.pin.set_low(),
            PinLevel::High => self.pin.set_high(),
        };
        result.map_err(|e| RelayError::PinWrite {
            level: level.as_str(),
            message: format!("{e:?}"),
        })?;
        self.writes += 1;
        Ok(level)
    }

    /// Returns the configured polarity.
    #[must_use]
    pub fn polarity(&self) -> RelayPolarity {
        self.polarity
    }

    /// Number of successful pin writes.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Returns the underlying pin.
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Returns the underlying pin mutably.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}

/// Error raised by a [`RecordingPin`] told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedPinFault;

impl embedded_hal::digital::Error for InjectedPinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Output pin that records every level written to it.
///
/// Used by tests and simulations. Each write is also emitted as a `tracing`
/// event.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin {
    history: Vec<PinLevel>,
    fail_next: usize,
}

impl RecordingPin {
    /// Creates a pin with no recorded writes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Every level written so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PinLevel] {
        &self.history
    }

    /// The current level, `None` if never written.
    #[must_use]
    pub fn level(&self) -> Option<PinLevel> {
        self.history.last().copied()
    }

    /// Number of times the level actually changed.
    #[must_use]
    pub fn level_changes(&self) -> usize {
        self.history.windows(2).filter(|w| w[0] != w[1]).count()
    }

    fn write(&mut self, level: PinLevel) -> Result<(), InjectedPinFault> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            tracing::warn!(level = %level, "Pin write failed");
            return Err(InjectedPinFault);
        }
        tracing::debug!(level = %level, "Pin written");
        self.history.push(level);
        Ok(())
    }
}

impl ErrorType for RecordingPin {
    type Error = InjectedPinFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(PinLevel::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(PinLevel::High)
    }
}

/// Output pin for hosts without GPIO: reports each write on the console.
///
/// Only the current level is kept, so it can run indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePin {
    level: Option<PinLevel>,
}

impl ConsolePin {
    /// Creates a pin that has not been written yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current level, `None` if never written.
    #[must_use]
    pub fn level(&self) -> Option<PinLevel> {
        self.level
    }

    fn write(&mut self, level: PinLevel) {
        if self.level != Some(level) {
            tracing::info!(level = %level, "Relay pin set");
        }
        self.level = Some(level);
    }
}

impl ErrorType for ConsolePin {
    type Error = Infallible;
}

impl OutputPin for ConsolePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(PinLevel::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(PinLevel::High);
        Ok(())
    }
}
