// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the sensor, the store and the control loop.
//!
//! # Types
//!
//! - [`HumidityReading`] - A humidity sample or an explicit "no reading"
//! - [`ActuatorState`] - On/Off state of the irrigation relay
//! - [`Uptime`] - Wrapping millisecond counter since boot

mod actuator;
mod humidity;
mod uptime;

pub use actuator::ActuatorState;
pub use humidity::{
    HumidityReading, one_decimal, serialize_one_decimal, serialize_opt_one_decimal,
};
pub use uptime::Uptime;
