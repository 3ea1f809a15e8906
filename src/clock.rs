// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uptime clocks.
//!
//! The control loop never reads wall-clock time. It asks a [`Clock`] for the
//! current [`Uptime`] and does all interval arithmetic with wrapping
//! subtraction.
//!
//! - [`SystemClock`]: monotonic, counts from its own creation
//! - [`ManualClock`]: set and advanced by hand, for tests and simulations

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::Uptime;

/// Source of the device uptime.
pub trait Clock {
    /// Returns the current uptime.
    fn now(&self) -> Uptime;
}

/// Monotonic clock backed by tokio's [`Instant`].
///
/// Follows the tokio clock, so it stops while tokio time is paused.
///
/// The counter is truncated to 32 bits like a microcontroller `millis()`
/// counter, so it wraps after about 49.7 days. An optional start offset makes
/// it possible to run the node close to the wrap on purpose.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
    offset: Uptime,
}

impl SystemClock {
    /// Creates a clock reading zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            offset: Uptime::ZERO,
        }
    }

    /// Creates a clock reading `offset` now.
    #[must_use]
    pub fn starting_at(offset: Uptime) -> Self {
        Self {
            started: Instant::now(),
            offset,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Uptime {
        self.offset.wrapping_add(self.started.elapsed())
    }
}

/// Hand-driven clock.
///
/// Clones share the same counter, so a test can keep one handle and give
/// another to the loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use irrigation_sync::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(3_000));
/// assert_eq!(clock.now().as_millis(), 3_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU32>);

impl ManualClock {
    /// Creates a clock reading `millis`.
    #[must_use]
    pub fn new(millis: u32) -> Self {
        Self(Arc::new(AtomicU32::new(millis)))
    }

    /// Sets the current reading.
    pub fn set(&self, now: Uptime) {
        self.0.store(now.as_millis(), Ordering::SeqCst);
    }

    /// Advances the reading, wrapping at `u32::MAX`.
    pub fn advance(&self, by: Duration) {
        let now = self.now().wrapping_add(by);
        self.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Uptime {
        Uptime::from_millis(self.0.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_counter() {
        let clock = ManualClock::new(10);
        let other = clock.clone();
        other.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Uptime::from_millis(15));
    }

    #[test]
    fn manual_clock_wraps() {
        let clock = ManualClock::new(u32::MAX - 1);
        clock.advance(Duration::from_millis(3));
        assert_eq!(clock.now(), Uptime::from_millis(1));
    }

    #[test]
    fn system_clock_starts_at_offset() {
        let clock = SystemClock::starting_at(Uptime::from_millis(1_000));
        let now = clock.now().as_millis();
        assert!((1_000..2_000).contains(&now));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b.elapsed_since(a) < Duration::from_secs(1));
    }
}
