// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relative humidity readings.

use std::fmt;

use serde::Serializer;

use crate::error::SensorError;

/// One humidity sample from the sensor.
///
/// A failed read is an explicit [`HumidityReading::Invalid`] rather than a
/// default value, so the loop can skip publishing it.
///
/// # Examples
///
/// ```
/// use irrigation_sync::types::HumidityReading;
///
/// let reading = HumidityReading::from_raw(25.34);
/// assert_eq!(reading.percent(), Some(25.34));
///
/// let failed = HumidityReading::from_raw(f32::NAN);
/// assert!(!failed.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HumidityReading {
    /// A usable relative humidity in percent.
    Valid(f32),
    /// The sensor produced no usable value this cycle.
    Invalid,
}

impl HumidityReading {
    /// Wraps a raw driver value, mapping NaN and infinities to `Invalid`.
    #[must_use]
    pub fn from_raw(value: f32) -> Self {
        if value.is_finite() {
            Self::Valid(value)
        } else {
            Self::Invalid
        }
    }

    /// Returns `true` if the reading carries a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns the percentage, if valid.
    #[must_use]
    pub fn percent(&self) -> Option<f32> {
        match self {
            Self::Valid(value) => Some(*value),
            Self::Invalid => None,
        }
    }

    /// Converts the reading into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::NoReading`] for an invalid reading.
    pub fn into_result(self) -> Result<f32, SensorError> {
        self.percent().ok_or(SensorError::NoReading)
    }
}

impl fmt::Display for HumidityReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(value) => write!(f, "{value:.1} %"),
            Self::Invalid => f.write_str("no reading"),
        }
    }
}

/// Rounds a percentage to one decimal place for the wire.
///
/// Rounding happens in `f64` so that values such as `25.3f32` serialize as
/// `25.3` and not `25.299999237060547`.
#[must_use]
pub fn one_decimal(value: f32) -> f64 {
    (f64::from(value) * 10.0).round() / 10.0
}

/// Serde helper writing an `f32` percentage with one decimal.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(one_decimal(*value))
}

/// Serde helper for optional percentages, see [`serialize_one_decimal`].
///
/// # Errors
///
/// Propagates serializer errors.
#[allow(clippy::ref_option)]
pub fn serialize_opt_one_decimal<S: Serializer>(
    value: &Option<f32>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&one_decimal(*v)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_invalid() {
        assert_eq!(HumidityReading::from_raw(f32::NAN), HumidityReading::Invalid);
        assert_eq!(
            HumidityReading::from_raw(f32::INFINITY),
            HumidityReading::Invalid
        );
    }

    #[test]
    fn into_result_maps_invalid_to_error() {
        assert_eq!(
            HumidityReading::Invalid.into_result(),
            Err(SensorError::NoReading)
        );
        assert_eq!(HumidityReading::Valid(50.0).into_result(), Ok(50.0));
    }

    #[test]
    fn one_decimal_rounds() {
        assert_eq!(one_decimal(25.3), 25.3);
        assert_eq!(one_decimal(25.34), 25.3);
        assert_eq!(one_decimal(25.36), 25.4);
        assert_eq!(one_decimal(0.0), 0.0);
    }

    #[test]
    fn one_decimal_serializes_cleanly() {
        #[derive(serde::Serialize)]
        struct Probe {
            #[serde(serialize_with = "serialize_one_decimal")]
            v: f32,
        }
        let json = serde_json::to_string(&Probe { v: 25.3 }).unwrap();
        assert_eq!(json, r#"{"v":25.3}"#);
    }

    #[test]
    fn display_formats() {
        assert_eq!(HumidityReading::Valid(41.26).to_string(), "41.3 %");
        assert_eq!(HumidityReading::Invalid.to_string(), "no reading");
    }
}
