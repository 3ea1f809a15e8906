// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store-facing state: what the node reads and what it writes.
//!
//! - [`DesiredValue`] - Desired actuator state decoded from `atuador/estado`
//! - [`SensorRecord`], [`ActuatorRecord`], [`ChangeLogEntry`] - Documents
//!   written back to the store

mod desired;
mod records;

pub use desired::{DecodeMode, DesiredValue};
pub use records::{ActuatorRecord, ChangeLogEntry, SensorRecord};
