// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The periodic synchronization loop.
//!
//! [`SyncLoop`] owns the collaborators (store, sensor, relay, clock) and
//! [`LoopState`] carries what the loop remembers between ticks. Every
//! [`SyncLoop::tick`] returns a [`TickReport`] describing what it did.

mod loop_state;
mod report;
mod sync_loop;
mod timer;

pub use loop_state::{LoopState, ReconcilePhase};
pub use report::{PollOutcome, SensorOutcome, TickReport, Transition};
pub use sync_loop::SyncLoop;
pub use timer::IntervalTimer;
