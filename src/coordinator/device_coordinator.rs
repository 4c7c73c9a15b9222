// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state coordinator.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast, watch};

use crate::entity::{Entity, entities_for};
use crate::error::Error;
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::protocol::Api;
use crate::response::{Attribute, Device};
use crate::state::{DeviceState, StateChange};
use crate::types::{FanSpeed, MacAddress, Model};

use super::{CoordinatorConfig, RefreshHealth};

/// Manufacturer reported for every device.
pub const MANUFACTURER: &str = "BlueAir";

/// Polls and caches the state of one device and runs its commands.
///
/// Accessors read the cache synchronously and return `None` for anything not
/// fetched yet. [`refresh`](Self::refresh) and the command methods are async
/// and serialized per device.
pub struct DeviceCoordinator<A> {
    id: DeviceId,
    device: Device,
    api: Arc<A>,
    config: CoordinatorConfig,
    state: RwLock<DeviceState>,
    state_tx: watch::Sender<DeviceState>,
    health: RwLock<RefreshHealth>,
    exclusive: Mutex<()>,
    event_bus: EventBus,
}

impl<A: Api> DeviceCoordinator<A> {
    /// Creates a coordinator with an empty cache.
    ///
    /// Nothing is fetched until [`refresh`](Self::refresh) is called.
    #[must_use]
    pub fn new(device: Device, api: Arc<A>, config: CoordinatorConfig) -> Self {
        let state = DeviceState::new();
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            id: DeviceId::new(&device.uuid),
            device,
            api,
            config,
            state: RwLock::new(state),
            state_tx,
            health: RwLock::new(RefreshHealth::new()),
            exclusive: Mutex::new(()),
            event_bus: EventBus::new(),
        }
    }

    /// Publishes events into `event_bus` instead of a private bus.
    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Fetches the device's state and replaces the cache.
    ///
    /// Waits for any command or refresh already running on this device.
    ///
    /// # Errors
    ///
    /// Returns the error of the information or attribute fetch, or
    /// `Error::Timeout` if the refresh exceeds its bound. The cache is left
    /// untouched in either case. Telemetry failures are not errors.
    pub async fn refresh(&self) -> Result<(), Error> {
        let _guard = self.exclusive.lock().await;
        self.refresh_locked().await
    }

    /// Refresh body; the caller holds `exclusive`.
    async fn refresh_locked(&self) -> Result<(), Error> {
        let bound = self.config.refresh_timeout();
        let result = match tokio::time::timeout(bound, self.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(bound)),
        };

        match result {
            Ok(change) => {
                self.apply(change);
                self.record_success();
                Ok(())
            }
            Err(error) => {
                self.record_failure(&error);
                Err(error)
            }
        }
    }

    async fn fetch(&self) -> Result<StateChange, Error> {
        let uuid = self.device.uuid.as_str();

        let information = self.api.get_info(uuid).await?;

        let data_point = match self.api.get_data_point(uuid).await {
            Ok(data_point) => Some(data_point),
            Err(error) => {
                tracing::debug!(
                    device = %self.id,
                    %error,
                    "Telemetry unavailable, keeping previous values"
                );
                None
            }
        };

        let attributes = self.api.get_attributes(uuid).await?;

        Ok(StateChange::refresh(information, data_point, attributes))
    }

    /// Applies a change to the cache and notifies watchers if it changed
    /// anything.
    fn apply(&self, change: StateChange) {
        let new_state = {
            let mut state = self.state.write();
            if !state.apply(&change) {
                return;
            }
            state.clone()
        };

        self.state_tx.send_replace(new_state.clone());
        self.event_bus.publish(DeviceEvent::state_changed(
            self.id.clone(),
            change,
            new_state,
        ));
    }

    fn record_success(&self) {
        let threshold = self.config.unavailable_threshold();
        let (was_available, available) = {
            let mut health = self.health.write();
            let was_available = health.is_available(threshold);
            health.record_success(Utc::now());
            (was_available, health.is_available(threshold))
        };

        tracing::debug!(device = %self.id, "Refresh succeeded");
        self.publish_availability(was_available, available);
    }

    fn record_failure(&self, error: &Error) {
        let threshold = self.config.unavailable_threshold();
        let (was_available, available, failures) = {
            let mut health = self.health.write();
            let was_available = health.is_available(threshold);
            health.record_failure(error.to_string());
            (
                was_available,
                health.is_available(threshold),
                health.consecutive_failures(),
            )
        };

        tracing::warn!(device = %self.id, %error, failures, "Refresh failed");
        self.event_bus.publish(DeviceEvent::refresh_failed(
            self.id.clone(),
            error.to_string(),
        ));
        self.publish_availability(was_available, available);
    }

    fn publish_availability(&self, was_available: bool, available: bool) {
        if was_available == available {
            return;
        }
        if available {
            tracing::info!(device = %self.id, "Device available");
        } else {
            tracing::warn!(device = %self.id, "Device unavailable");
        }
        self.event_bus.publish(DeviceEvent::availability_changed(
            self.id.clone(),
            available,
        ));
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Sets the fan level to a raw value such as `"0"` to `"3"`.
    ///
    /// The new value is readable immediately. The remote write follows, then
    /// a forced refresh that replaces the optimistic value with whatever the
    /// device reports. A failed remote write is only logged.
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn set_fan_speed(&self, level: impl Into<String>) -> Result<(), Error> {
        self.command(Attribute::FanSpeed, level.into()).await
    }

    /// Sets the fan mode to a raw value such as `"auto"`.
    ///
    /// Follows the same optimistic sequence as
    /// [`set_fan_speed`](Self::set_fan_speed).
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn set_fan_mode(&self, mode: impl Into<String>) -> Result<(), Error> {
        self.command(Attribute::Mode, mode.into()).await
    }

    /// Sets a validated fan level.
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn set_fan_level(&self, level: FanSpeed) -> Result<(), Error> {
        self.set_fan_speed(level.as_api_value()).await
    }

    /// Sets the fan level closest to a percentage.
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn set_percentage(&self, percentage: u8) -> Result<(), Error> {
        self.set_fan_level(FanSpeed::from_percentage(percentage)).await
    }

    /// Turns the fan on at the default level.
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn turn_on(&self) -> Result<(), Error> {
        self.set_fan_level(FanSpeed::DEFAULT_ON).await
    }

    /// Turns the fan off.
    ///
    /// # Errors
    ///
    /// Returns the error of the trailing refresh.
    pub async fn turn_off(&self) -> Result<(), Error> {
        self.set_fan_level(FanSpeed::OFF).await
    }

    async fn command(&self, attribute: Attribute, value: String) -> Result<(), Error> {
        let _guard = self.exclusive.lock().await;

        tracing::debug!(device = %self.id, %attribute, %value, "Sending command");
        self.apply(StateChange::attribute(attribute, value.clone()));

        if let Err(error) = self
            .api
            .set_attribute(&self.device.uuid, attribute, &value)
            .await
        {
            tracing::warn!(device = %self.id, %attribute, %value, %error, "Command failed");
        }

        self.refresh_locked().await
    }
}

impl<A> DeviceCoordinator<A> {
    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the device id.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the device entry this coordinator was created for.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the nickname, or the account's device name when unset.
    #[must_use]
    pub fn device_name(&self) -> String {
        self.state
            .read()
            .nickname()
            .map_or_else(|| self.device.name.clone(), str::to_string)
    }

    /// Returns the manufacturer.
    #[must_use]
    pub fn manufacturer(&self) -> &'static str {
        MANUFACTURER
    }

    /// Returns the reported model, or the device uuid when unknown.
    #[must_use]
    pub fn model(&self) -> Model {
        self.state.read().model_or(&self.device.uuid)
    }

    /// Returns the room location.
    #[must_use]
    pub fn room_location(&self) -> Option<String> {
        self.state.read().room_location().map(str::to_string)
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn firmware(&self) -> Option<String> {
        self.state.read().firmware().map(str::to_string)
    }

    /// Returns the normalized MAC address.
    #[must_use]
    pub fn mac_address(&self) -> Option<MacAddress> {
        self.state.read().mac_address()
    }

    // =========================================================================
    // Telemetry
    // =========================================================================

    /// Returns the temperature in degrees Celsius.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.state.read().temperature()
    }

    /// Returns the relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.state.read().humidity()
    }

    /// Returns the CO2 concentration in ppm.
    #[must_use]
    pub fn co2(&self) -> Option<f64> {
        self.state.read().co2()
    }

    /// Returns the VOC concentration in ppb.
    #[must_use]
    pub fn voc(&self) -> Option<f64> {
        self.state.read().voc()
    }

    /// Returns PM1 in µg/m³.
    #[must_use]
    pub fn pm1(&self) -> Option<f64> {
        self.state.read().pm1()
    }

    /// Returns PM10 in µg/m³.
    #[must_use]
    pub fn pm10(&self) -> Option<f64> {
        self.state.read().pm10()
    }

    /// Returns PM2.5 in µg/m³.
    #[must_use]
    pub fn pm25(&self) -> Option<f64> {
        self.state.read().pm25()
    }

    /// Returns the overall pollution index.
    #[must_use]
    pub fn all_pollution(&self) -> Option<f64> {
        self.state.read().all_pollution()
    }

    // =========================================================================
    // Control and status
    // =========================================================================

    /// Returns the fan level.
    #[must_use]
    pub fn fan_speed(&self) -> Option<u8> {
        self.state.read().fan_speed()
    }

    /// Returns whether the fan is running.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.state.read().is_on()
    }

    /// Returns the active preset mode.
    #[must_use]
    pub fn fan_mode(&self) -> Option<String> {
        self.state.read().fan_mode().map(str::to_string)
    }

    /// Returns `true` if the device reports a mode.
    #[must_use]
    pub fn fan_mode_supported(&self) -> bool {
        self.state.read().fan_mode_supported()
    }

    /// Returns the raw filter status.
    #[must_use]
    pub fn filter_status(&self) -> Option<String> {
        self.state.read().filter_status().map(str::to_string)
    }

    /// Returns `true` if the filter needs attention.
    #[must_use]
    pub fn filter_problem(&self) -> Option<bool> {
        self.state.read().filter_problem()
    }

    /// Returns the raw child lock value.
    #[must_use]
    pub fn child_lock(&self) -> Option<String> {
        self.state.read().child_lock().map(str::to_string)
    }

    /// Returns the child lock flag.
    #[must_use]
    pub fn child_locked(&self) -> Option<bool> {
        self.state.read().child_locked()
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Returns a snapshot of the cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    /// Returns a receiver that sees every change to the cached state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<DeviceState> {
        self.state_tx.subscribe()
    }

    /// Subscribes to this coordinator's events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the refresh history.
    #[must_use]
    pub fn health(&self) -> RefreshHealth {
        self.health.read().clone()
    }

    /// Returns `true` if the last success is recent enough to trust.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.health
            .read()
            .is_available(self.config.unavailable_threshold())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Lists the entities this device exposes for its current model.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        entities_for(&self.model(), &self.device.uuid, &self.device_name())
    }
}

impl<A> fmt::Debug for DeviceCoordinator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCoordinator")
            .field("id", &self.id)
            .field("name", &self.device.name)
            .field("health", &*self.health.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::response::{Attributes, DataPoint, DeviceInformation};

    /// Device that answers every call the same way.
    struct StaticApi {
        information: DeviceInformation,
        attributes: Attributes,
    }

    impl Api for StaticApi {
        async fn list_devices(&self) -> Result<Vec<Device>, Error> {
            Ok(vec![Device::new("u1", "Office")])
        }

        async fn get_info(&self, _uuid: &str) -> Result<DeviceInformation, Error> {
            Ok(self.information.clone())
        }

        async fn get_data_point(&self, _uuid: &str) -> Result<DataPoint, Error> {
            Err(ProtocolError::Unsupported("telemetry".into()).into())
        }

        async fn get_attributes(&self, _uuid: &str) -> Result<Attributes, Error> {
            Ok(self.attributes.clone())
        }

        async fn set_attribute(
            &self,
            _uuid: &str,
            _attribute: Attribute,
            _value: &str,
        ) -> Result<(), Error> {
            Ok(())
        }
    }

    fn coordinator(information: DeviceInformation) -> DeviceCoordinator<StaticApi> {
        let api = StaticApi {
            information,
            attributes: Attributes::new().with_raw("fan_speed", "1"),
        };
        DeviceCoordinator::new(
            Device::new("u1", "Office"),
            Arc::new(api),
            CoordinatorConfig::default(),
        )
    }

    #[test]
    fn identity_before_refresh() {
        let coordinator = coordinator(DeviceInformation::default());

        assert_eq!(coordinator.id().as_str(), "u1");
        assert_eq!(coordinator.device_name(), "Office");
        assert_eq!(coordinator.manufacturer(), "BlueAir");
        assert_eq!(coordinator.model().as_str(), "u1");
        assert_eq!(coordinator.mac_address(), None);
        assert_eq!(coordinator.fan_speed(), None);
        assert!(!coordinator.is_available());
    }

    #[tokio::test]
    async fn nickname_and_model_after_refresh() {
        let information = DeviceInformation {
            nickname: Some("Kids room".into()),
            compatibility: Some("classic_280i".into()),
            ..DeviceInformation::default()
        };
        let coordinator = coordinator(information);

        coordinator.refresh().await.unwrap();

        assert_eq!(coordinator.device_name(), "Kids room");
        assert_eq!(coordinator.model().as_str(), "classic_280i");
        assert_eq!(coordinator.fan_speed(), Some(1));
        assert!(coordinator.is_available());
        assert!(!coordinator.entities().is_empty());
    }

    #[tokio::test]
    async fn watch_sees_refresh() {
        let coordinator = coordinator(DeviceInformation::default());
        let mut rx = coordinator.watch();

        coordinator.refresh().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().fan_speed(), Some(1));
    }
}
