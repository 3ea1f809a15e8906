// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polled interval timer on the wrapping uptime counter.

use std::time::Duration;

use crate::types::Uptime;

/// Fires at most once per poll when a period has elapsed since the previous
/// fire.
///
/// Each fire restarts the period at the fire time, so two fires are never
/// closer than one period. A late tick delays the following fires by the
/// same amount instead of catching up.
///
/// All arithmetic is wrapping, so the schedule survives the counter rolling
/// over.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use irrigation_sync::sync::IntervalTimer;
/// use irrigation_sync::types::Uptime;
///
/// let mut timer = IntervalTimer::new(Duration::from_millis(100), Uptime::ZERO);
/// assert!(!timer.poll(Uptime::from_millis(99)));
/// assert!(timer.poll(Uptime::from_millis(103)));
/// // The next period starts at the fire.
/// assert!(!timer.poll(Uptime::from_millis(200)));
/// assert!(timer.poll(Uptime::from_millis(203)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    last: Uptime,
}

impl IntervalTimer {
    /// Creates a timer whose first fire is one `period` after `start`.
    #[must_use]
    pub const fn new(period: Duration, start: Uptime) -> Self {
        Self {
            period,
            last: start,
        }
    }

    /// Returns the period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// The instant of the previous fire, or the start.
    #[must_use]
    pub const fn last(&self) -> Uptime {
        self.last
    }

    /// Time left until the next fire, zero if overdue.
    #[must_use]
    pub fn remaining(&self, now: Uptime) -> Duration {
        self.period.saturating_sub(now.elapsed_since(self.last))
    }

    /// Returns `true` and re-arms if a period has elapsed at `now`.
    pub fn poll(&mut self, now: Uptime) -> bool {
        let elapsed = now.elapsed_since(self.last);
        if elapsed < self.period {
            return false;
        }

        if elapsed >= self.period.saturating_mul(2) {
            tracing::debug!(
                period_ms = self.period.as_millis(),
                late_ms = (elapsed - self.period).as_millis(),
                "Timer fell behind"
            );
        }
        self.last = now;
        true
    }
}
