// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Humidity sensor abstraction.
//!
//! The concrete driver (DHT11/DHT22 bit-banging, I2C, ...) lives outside this
//! crate. The loop only needs something that hands back a
//! [`HumidityReading`] each time it is asked.

use std::collections::VecDeque;

use crate::types::HumidityReading;

/// A source of humidity readings.
pub trait HumiditySensor {
    /// Acquires one reading. Failures are reported as
    /// [`HumidityReading::Invalid`], never by panicking.
    fn read_humidity(&mut self) -> HumidityReading;
}

impl<S: HumiditySensor + ?Sized> HumiditySensor for Box<S> {
    fn read_humidity(&mut self) -> HumidityReading {
        (**self).read_humidity()
    }
}

/// Sensor that replays a fixed script of readings.
///
/// Once the script is exhausted the last reading is repeated, or, when built
/// with [`ScriptedSensor::cycle`], the script starts over.
///
/// # Examples
///
/// ```
/// use irrigation_sync::sensor::{HumiditySensor, ScriptedSensor};
/// use irrigation_sync::types::HumidityReading;
///
/// let mut sensor = ScriptedSensor::new([30.0, f32::NAN]);
/// assert_eq!(sensor.read_humidity(), HumidityReading::Valid(30.0));
/// assert_eq!(sensor.read_humidity(), HumidityReading::Invalid);
/// assert_eq!(sensor.read_humidity(), HumidityReading::Invalid);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    script: VecDeque<HumidityReading>,
    last: HumidityReading,
    cycle: bool,
    reads: usize,
}

impl ScriptedSensor {
    /// Creates a sensor replaying `values` once, then repeating the last one.
    ///
    /// Raw values go through [`HumidityReading::from_raw`], so `NaN` becomes a
    /// failed read.
    pub fn new(values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            script: values.into_iter().map(HumidityReading::from_raw).collect(),
            last: HumidityReading::Invalid,
            cycle: false,
            reads: 0,
        }
    }

    /// Creates a sensor replaying `values` forever.
    pub fn cycle(values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            cycle: true,
            ..Self::new(values)
        }
    }

    /// Creates a sensor that always returns `value`.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new([value])
    }

    /// Number of readings taken so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl HumiditySensor for ScriptedSensor {
    fn read_humidity(&mut self) -> HumidityReading {
        self.reads += 1;
        if let Some(next) = self.script.pop_front() {
            if self.cycle {
                self.script.push_back(next);
            }
            self.last = next;
        }
        self.last
    }
}
