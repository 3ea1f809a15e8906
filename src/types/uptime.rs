// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device uptime in milliseconds.
//!
//! The node measures every interval and every duration against a 32-bit
//! millisecond counter that starts at boot and wraps back to zero after
//! roughly 49.7 days. All comparisons go through unsigned wrapping
//! subtraction, so an elapsed time stays correct across the wrap as long as
//! the real elapsed time is shorter than one full counter period.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use irrigation_sync::types::Uptime;
//!
//! let before = Uptime::from_millis(u32::MAX - 499);
//! let after = before.wrapping_add(Duration::from_millis(1_500));
//!
//! assert_eq!(after.as_millis(), 1_000);
//! assert_eq!(after.elapsed_since(before), Duration::from_millis(1_500));
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Milliseconds since boot, wrapping at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uptime(u32);

impl Uptime {
    /// The boot instant.
    pub const ZERO: Self = Self(0);

    /// Creates an uptime value from a raw millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond count.
    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, using wrapping subtraction.
    #[must_use]
    pub fn elapsed_since(self, earlier: Self) -> Duration {
        Duration::from_millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }

    /// Advances this instant by `duration`, wrapping around the counter.
    ///
    /// Durations longer than the counter period are truncated to their
    /// low 32 bits of milliseconds, which is what the hardware counter does.
    #[must_use]
    pub fn wrapping_add(self, duration: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let millis = duration.as_millis() as u32;
        Self(self.0.wrapping_add(millis))
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u32> for Uptime {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_without_wrap() {
        let a = Uptime::from_millis(100_000);
        let b = Uptime::from_millis(120_000);
        assert_eq!(b.elapsed_since(a), Duration::from_millis(20_000));
    }

    #[test]
    fn elapsed_across_wrap() {
        let a = Uptime::from_millis(u32::MAX - 2_000);
        let b = Uptime::from_millis(7_999);
        assert_eq!(b.elapsed_since(a), Duration::from_millis(10_000));
    }

    #[test]
    fn elapsed_to_self_is_zero() {
        let a = Uptime::from_millis(42);
        assert_eq!(a.elapsed_since(a), Duration::ZERO);
    }

    #[test]
    fn wrapping_add_wraps() {
        let a = Uptime::from_millis(u32::MAX);
        assert_eq!(a.wrapping_add(Duration::from_millis(1)), Uptime::ZERO);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&Uptime::from_millis(120_000)).unwrap();
        assert_eq!(json, "120000");
    }

    #[test]
    fn display_has_unit() {
        assert_eq!(Uptime::from_millis(3_000).to_string(), "3000ms");
    }
}
