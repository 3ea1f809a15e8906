// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The synchronization loop.

use std::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::clock::Clock;
use crate::config::{ControlMode, PinWritePolicy, SyncConfig};
use crate::error::ConfigError;
use crate::relay::Relay;
use crate::sensor::HumiditySensor;
use crate::state::{ActuatorRecord, ChangeLogEntry, DesiredValue, SensorRecord};
use crate::store::{RemoteStore, StoreLayout};
use crate::sync::{LoopState, PollOutcome, ReconcilePhase, SensorOutcome, TickReport, Transition};
use crate::types::{ActuatorState, Uptime};

/// Keeps the relay in step with the desired state held by the remote store
/// and publishes humidity readings.
///
/// Each [`tick`](Self::tick) checks two independent timers:
///
/// - the **sensor timer** (default every 10 s) reads the sensor and `PUT`s
///   the reading to `<root>/sensor`;
/// - the **poll timer** (default every 3 s) `GET`s `<root>/atuador/estado`
///   and reconciles the relay with it.
///
/// Requests are awaited one after the other. No failure stops the loop: store
/// and sensor problems are logged and the next tick tries again.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use irrigation_sync::clock::ManualClock;
/// use irrigation_sync::config::SyncConfig;
/// use irrigation_sync::relay::{PinLevel, RecordingPin};
/// use irrigation_sync::sensor::ScriptedSensor;
/// use irrigation_sync::store::MemoryStore;
/// use irrigation_sync::sync::SyncLoop;
/// use irrigation_sync::types::ActuatorState;
///
/// # tokio_test_block_on(async {
/// let store = MemoryStore::with_tree(serde_json::json!({
///     "irrigacao": { "atuador": { "estado": true } }
/// }));
/// let clock = ManualClock::new(0);
/// let mut node = SyncLoop::new(
///     SyncConfig::default(),
///     store.clone(),
///     ScriptedSensor::constant(30.0),
///     RecordingPin::new(),
///     clock.clone(),
/// )
/// .unwrap();
///
/// let mut state = node.start();
/// clock.advance(Duration::from_secs(3));
/// let report = node.tick(&mut state).await;
///
/// assert_eq!(state.applied(), ActuatorState::On);
/// assert!(report.transition().is_some());
/// assert_eq!(node.relay().pin().level(), Some(PinLevel::Low));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct SyncLoop<S, H, P, C> {
    config: SyncConfig,
    layout: StoreLayout,
    store: S,
    sensor: H,
    relay: Relay<P>,
    clock: C,
}

impl<S, H, P, C> SyncLoop<S, H, P, C>
where
    S: RemoteStore,
    H: HumiditySensor,
    P: OutputPin,
    C: Clock,
{
    /// Assembles a loop from its collaborators.
    ///
    /// The relay polarity comes from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` does not validate.
    pub fn new(
        config: SyncConfig,
        store: S,
        sensor: H,
        pin: P,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = config.layout()?;
        let relay = Relay::new(pin, config.polarity());

        Ok(Self {
            config,
            layout,
            store,
            sensor,
            relay,
            clock,
        })
    }

    /// Drives the relay off and returns the boot state, with both timers
    /// starting now.
    ///
    /// If the initial pin write fails the state is marked out of sync, and
    /// the first desired-state poll writes the pin again.
    pub fn start(&mut self) -> LoopState {
        let now = self.clock.now();
        let mut state = LoopState::new(
            now,
            self.config.sensor_interval(),
            self.config.poll_interval(),
        );

        match self.relay.drive(ActuatorState::Off) {
            Ok(level) => {
                state.pin_synced = true;
                tracing::info!(
                    level = %level,
                    root = %self.layout.root(),
                    sensor_interval_ms = self.config.sensor_interval().as_millis(),
                    poll_interval_ms = self.config.poll_interval().as_millis(),
                    "Irrigation node started, relay off"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to switch relay off at startup");
            }
        }

        state
    }

    /// Runs one loop iteration.
    ///
    /// Ticks where neither timer fires do nothing and return an idle report.
    pub async fn tick(&mut self, state: &mut LoopState) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::new(now);

        if state.sensor_timer.poll(now) {
            report.sensor = Some(self.publish_reading(state).await);
        }

        if state.poll_timer.poll(now) {
            report.poll = Some(self.poll_desired(state).await);
        }

        report
    }

    /// Ticks forever, sleeping `tick_interval` between iterations.
    pub async fn run(&mut self, state: &mut LoopState) {
        let pause = self.config.tick_interval();
        tracing::debug!(tick_interval_ms = pause.as_millis(), "Entering synchronization loop");

        loop {
            self.tick(state).await;
            tokio::time::sleep(pause).await;
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store layout.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Returns the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the sensor.
    #[must_use]
    pub fn sensor(&self) -> &H {
        &self.sensor
    }

    /// Returns the relay.
    #[must_use]
    pub fn relay(&self) -> &Relay<P> {
        &self.relay
    }

    /// Returns the relay mutably, e.g. to inject pin faults.
    pub fn relay_mut(&mut self) -> &mut Relay<P> {
        &mut self.relay
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ========================================================================
    // Sensor publish
    // ========================================================================

    async fn publish_reading(&mut self, state: &mut LoopState) -> SensorOutcome {
        let reading = self.sensor.read_humidity();

        let percent = match reading.into_result() {
            Ok(percent) => percent,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping humidity publish");
                return SensorOutcome {
                    reading,
                    published: false,
                    decided: None,
                };
            }
        };

        state.last_humidity = Some(percent);
        tracing::info!(humidity = %reading, "Humidity read");

        let published = match self
            .store
            .put_json(&self.layout.sensor(), &SensorRecord::new(percent))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to publish humidity");
                false
            }
        };

        let decided = match self.config.control() {
            ControlMode::Remote => None,
            ControlMode::LocalThreshold { limit_percent } => {
                Some(self.decide_locally(percent, limit_percent).await)
            }
        };

        SensorOutcome {
            reading,
            published,
            decided,
        }
    }

    async fn decide_locally(&self, percent: f32, limit_percent: f32) -> ActuatorState {
        let decision = ActuatorState::from(percent < limit_percent);
        tracing::debug!(
            humidity = percent,
            limit = limit_percent,
            decision = %decision,
            "Local threshold decision"
        );

        if let Err(e) = self
            .store
            .put_json(&self.layout.actuator_state(), &decision)
            .await
        {
            tracing::warn!(error = %e, "Failed to write local decision");
        }

        decision
    }

    // ========================================================================
    // Desired-state poll and reconciliation
    // ========================================================================

    async fn poll_desired(&mut self, state: &mut LoopState) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        let desired = match self.store.get(&self.layout.actuator_state()).await {
            Ok(response) => DesiredValue::decode(response.body(), self.config.decode_mode()),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    keeping = %state.desired,
                    "Failed to read desired state"
                );
                return outcome;
            }
        };

        tracing::debug!(desired = %desired, "Desired state polled");
        outcome.desired = Some(desired);
        state.last_desired = Some(desired);
        state.desired = desired.resolve();

        if desired.is_absent() && self.config.initialize_missing_state() {
            outcome.initialized = self.initialize_desired_state().await;
        }

        self.reconcile(state, &mut outcome).await;
        outcome
    }

    async fn initialize_desired_state(&self) -> bool {
        match self
            .store
            .put_json(&self.layout.actuator(), &ActuatorRecord::initial())
            .await
        {
            Ok(_) => {
                tracing::info!(path = %self.layout.actuator(), "Initialized missing actuator state");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialize actuator state");
                false
            }
        }
    }

    async fn reconcile(&mut self, state: &mut LoopState, outcome: &mut PollOutcome) {
        if state.is_converged() {
            state.phase = ReconcilePhase::Idle;
            if self.config.pin_policy() == PinWritePolicy::EveryTick || !state.pin_synced {
                let applied = state.applied;
                self.write_pin(state, applied, outcome);
            }
            return;
        }

        state.phase = ReconcilePhase::DesiredDiffers;
        tracing::debug!(
            applied = %state.applied,
            desired = %state.desired,
            "Desired state differs from applied state"
        );

        state.phase = ReconcilePhase::Applying;
        let target = state.desired;
        if !self.write_pin(state, target, outcome) {
            state.phase = ReconcilePhase::DesiredDiffers;
            return;
        }

        let now = self.clock.now();
        let lasted = state
            .last_transition
            .map_or(Duration::ZERO, |previous| now.elapsed_since(previous));
        let from = state.applied;
        state.applied = target;
        state.last_transition = Some(now);
        state.phase = ReconcilePhase::Idle;

        tracing::info!(
            from = %from,
            to = %target,
            previous_state_ms = lasted.as_millis(),
            "IRRIGADOR: {}",
            target.console_label()
        );

        let entry = ChangeLogEntry::new(target, now, lasted, state.last_humidity);
        let log_written = self.config.change_log() && self.append_log(&entry).await;
        let actuator_written = self.record_transition(target, now).await;

        outcome.transition = Some(Transition {
            from,
            to: target,
            entry,
            log_written,
            actuator_written,
        });
    }

    fn write_pin(
        &mut self,
        state: &mut LoopState,
        target: ActuatorState,
        outcome: &mut PollOutcome,
    ) -> bool {
        match self.relay.drive(target) {
            Ok(level) => {
                tracing::debug!(state = %target, level = %level, "Relay driven");
                state.pin_synced = true;
                outcome.pin_written = true;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, state = %target, "Failed to drive relay");
                state.pin_synced = false;
                outcome.pin_error = Some(e);
                false
            }
        }
    }

    async fn append_log(&self, entry: &ChangeLogEntry) -> bool {
        match self.store.post_json(&self.layout.logs(), entry).await {
            Ok(response) => {
                tracing::debug!(response = %response.body(), "Change log entry appended");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to append change log entry");
                false
            }
        }
    }

    async fn record_transition(&self, state: ActuatorState, at: Uptime) -> bool {
        match self
            .store
            .put_json(&self.layout.actuator(), &ActuatorRecord::transitioned(state, at))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to record actuator state");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::relay::{PinLevel, RecordingPin, RelayPolarity};
    use crate::sensor::ScriptedSensor;
    use crate::store::{MemoryStore, StoreMethod};
    use serde_json::json;

    type TestLoop = SyncLoop<MemoryStore, ScriptedSensor, RecordingPin, ManualClock>;

    fn build(config: SyncConfig, store: &MemoryStore, clock: &ManualClock) -> TestLoop {
        SyncLoop::new(
            config,
            store.clone(),
            ScriptedSensor::constant(30.0),
            RecordingPin::new(),
            clock.clone(),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = SyncLoop::new(
            SyncConfig::new().with_poll_interval(Duration::ZERO),
            MemoryStore::new(),
            ScriptedSensor::constant(30.0),
            RecordingPin::new(),
            ManualClock::new(0),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn start_switches_relay_off() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut node = build(SyncConfig::default(), &store, &clock);

        let state = node.start();
        assert!(state.pin_synced());
        assert_eq!(node.relay().pin().history(), &[PinLevel::High]);
    }

    #[test]
    fn start_with_active_high_relay() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut node = build(
            SyncConfig::new().with_polarity(RelayPolarity::ActiveHigh),
            &store,
            &clock,
        );

        node.start();
        assert_eq!(node.relay().pin().level(), Some(PinLevel::Low));
    }

    #[tokio::test]
    async fn tick_before_any_period_is_idle() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut node = build(SyncConfig::default(), &store, &clock);
        let mut state = node.start();

        clock.advance(Duration::from_millis(2_999));
        let report = node.tick(&mut state).await;
        assert!(report.is_idle());
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn failed_startup_write_is_repeated_on_first_poll() {
        let store = MemoryStore::with_tree(json!({ "irrigacao": { "atuador": { "estado": false } } }));
        let clock = ManualClock::new(0);
        let mut node = build(SyncConfig::default(), &store, &clock);
        node.relay_mut().pin_mut().fail_next_writes(1);

        let mut state = node.start();
        assert!(!state.pin_synced());
        assert!(node.relay().pin().history().is_empty());

        clock.advance(Duration::from_secs(3));
        let report = node.tick(&mut state).await;
        let poll = report.poll.unwrap();
        assert!(poll.pin_written);
        assert!(poll.transition.is_none());
        assert!(state.pin_synced());
        assert_eq!(node.relay().pin().history(), &[PinLevel::High]);
    }

    #[tokio::test]
    async fn phase_stays_desired_differs_when_pin_fails() {
        let store = MemoryStore::with_tree(json!({ "irrigacao": { "atuador": { "estado": true } } }));
        let clock = ManualClock::new(0);
        let mut node = build(SyncConfig::default(), &store, &clock);
        let mut state = node.start();
        node.relay_mut().pin_mut().fail_next_writes(1);

        clock.advance(Duration::from_secs(3));
        let report = node.tick(&mut state).await;

        let poll = report.poll.unwrap();
        assert!(poll.pin_error.is_some());
        assert!(poll.transition.is_none());
        assert_eq!(state.phase(), ReconcilePhase::DesiredDiffers);
        assert_eq!(state.applied(), ActuatorState::Off);
        assert!(store.requests_to(StoreMethod::Post, &node.layout().logs()).is_empty());
    }

    #[tokio::test]
    async fn transition_returns_to_idle() {
        let store = MemoryStore::with_tree(json!({ "irrigacao": { "atuador": { "estado": true } } }));
        let clock = ManualClock::new(0);
        let mut node = build(SyncConfig::default(), &store, &clock);
        let mut state = node.start();

        clock.advance(Duration::from_secs(3));
        let report = node.tick(&mut state).await;

        let transition = report.transition().unwrap();
        assert_eq!(transition.from, ActuatorState::Off);
        assert_eq!(transition.to, ActuatorState::On);
        assert!(transition.log_written);
        assert!(transition.actuator_written);
        assert_eq!(state.phase(), ReconcilePhase::Idle);
        assert_eq!(state.last_transition(), Some(Uptime::from_millis(3_000)));
    }
}
