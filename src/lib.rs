// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Irrigation Sync - keeps an irrigation relay in step with a cloud store.
//!
//! An irrigation node reads a humidity sensor, publishes the reading to a
//! Firebase Realtime Database style REST store, polls the same store for the
//! desired actuator state and drives a relay accordingly, appending a
//! change-log entry for every transition.
//!
//! # Building Blocks
//!
//! - **Store**: [`RemoteStore`] trait, with [`HttpStore`] for the real
//!   database and [`MemoryStore`] as an in-process fake
//! - **Sensor**: [`HumiditySensor`] trait, with [`ScriptedSensor`]
//! - **Relay**: [`Relay`] over any `embedded-hal` output pin
//! - **Clock**: [`Clock`] trait for the 32-bit wrapping uptime counter
//! - **Loop**: [`SyncLoop`], one cooperative loop with two interval timers
//!
//! # Store Layout
//!
//! Everything lives under a configurable root (`/irrigacao` by default):
//!
//! - `sensor` - latest reading, `{ "umidade_percentual": 41.3 }`
//! - `atuador/estado` - desired state, `true`/`false`, may be absent
//! - `atuador` - applied state and uptime of the latest transition
//! - `logs` - append-only change log
//!
//! # Quick Start
//!
//! ```no_run
//! use irrigation_sync::{ConsolePin, HttpStoreConfig, ScriptedSensor, SyncConfig, SyncLoop, SystemClock};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> irrigation_sync::Result<()> {
//!     let store = HttpStoreConfig::new("my-project-default-rtdb.firebaseio.com").into_store()?;
//!
//!     let mut node = SyncLoop::new(
//!         SyncConfig::default(),
//!         store,
//!         ScriptedSensor::cycle([45.0, 38.0, 31.5]),
//!         ConsolePin::new(),
//!         SystemClock::new(),
//!     )?;
//!
//!     let mut state = node.start();
//!     node.run(&mut state).await;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod relay;
pub mod sensor;
pub mod state;
pub mod store;
pub mod sync;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(feature = "http")]
pub use config::NodeConfig;
pub use config::{ControlMode, PinWritePolicy, SyncConfig};
pub use error::{ConfigError, Error, RelayError, Result, SensorError, StoreError};
pub use relay::{ConsolePin, PinLevel, RecordingPin, Relay, RelayPolarity};
pub use sensor::{HumiditySensor, ScriptedSensor};
pub use state::{ActuatorRecord, ChangeLogEntry, DecodeMode, DesiredValue, SensorRecord};
#[cfg(feature = "http")]
pub use store::{HttpStore, HttpStoreConfig};
pub use store::{MemoryStore, RemoteStore, StoreLayout, StorePath};
pub use sync::{LoopState, ReconcilePhase, SyncLoop, TickReport};
pub use types::{ActuatorState, HumidityReading, Uptime};
