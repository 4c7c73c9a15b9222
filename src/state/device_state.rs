// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use crate::response::{Attribute, Attributes, DataPoint, DeviceInformation};
use crate::types::{MacAddress, Model};

use super::StateChange;

/// Mode value that carries no preset.
const MANUAL_MODE: &str = "manual";

/// Filter status reported by a healthy filter.
const FILTER_OK: &str = "OK";

/// Child lock value that reads as locked.
const CHILD_LOCK_LOCKED: &str = "0";

/// Cached state of a Blueair device.
///
/// Holds the three groups fetched on every refresh. All accessors are pure
/// and return `None` for anything the device has not reported yet, so a
/// state that was never refreshed answers "unknown" everywhere.
///
/// # Examples
///
/// ```
/// use blueair_lib::response::{Attribute, Attributes};
/// use blueair_lib::state::{DeviceState, StateChange};
///
/// let mut state = DeviceState::new();
/// assert_eq!(state.is_on(), None);
///
/// let attributes = Attributes::new()
///     .with_raw("fan_speed", "0")
///     .with_raw("filter_status", "WARN");
/// state.apply(&StateChange::Attributes(attributes));
///
/// assert_eq!(state.is_on(), Some(false));
/// assert_eq!(state.filter_problem(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    information: DeviceInformation,
    data_point: DataPoint,
    attributes: Attributes,
}

impl DeviceState {
    /// Creates a new empty device state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached device information.
    #[must_use]
    pub fn information(&self) -> &DeviceInformation {
        &self.information
    }

    /// Returns the cached telemetry.
    #[must_use]
    pub fn data_point(&self) -> &DataPoint {
        &self.data_point
    }

    /// Returns the cached attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    // ========== Information ==========

    /// Returns the display name override.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.information.nickname.as_deref()
    }

    /// Returns the model, falling back to `default_id` when unreported.
    #[must_use]
    pub fn model_or(&self, default_id: &str) -> Model {
        Model::new(
            self.information
                .compatibility
                .as_deref()
                .unwrap_or(default_id),
        )
    }

    /// Returns the room location.
    #[must_use]
    pub fn room_location(&self) -> Option<&str> {
        self.information.room_location.as_deref()
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn firmware(&self) -> Option<&str> {
        self.information.firmware.as_deref()
    }

    /// Returns the normalized MAC address.
    #[must_use]
    pub fn mac_address(&self) -> Option<MacAddress> {
        self.information.mac.as_deref().map(MacAddress::normalize)
    }

    // ========== Telemetry ==========

    /// Gets the temperature in degrees Celsius.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.data_point.temperature
    }

    /// Gets the relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.data_point.humidity
    }

    /// Gets the CO2 concentration in ppm.
    #[must_use]
    pub fn co2(&self) -> Option<f64> {
        self.data_point.co2
    }

    /// Gets the VOC concentration in ppb.
    #[must_use]
    pub fn voc(&self) -> Option<f64> {
        self.data_point.voc
    }

    /// Gets PM1 in µg/m³.
    #[must_use]
    pub fn pm1(&self) -> Option<f64> {
        self.data_point.pm1
    }

    /// Gets PM10 in µg/m³.
    #[must_use]
    pub fn pm10(&self) -> Option<f64> {
        self.data_point.pm10
    }

    /// Gets PM2.5 in µg/m³.
    #[must_use]
    pub fn pm25(&self) -> Option<f64> {
        self.data_point.pm25
    }

    /// Gets the overall pollution index in percent.
    #[must_use]
    pub fn all_pollution(&self) -> Option<f64> {
        self.data_point.all_pollution
    }

    // ========== Fan ==========

    /// Gets the fan level.
    ///
    /// Returns `None` if the level is unknown or not an integer.
    #[must_use]
    pub fn fan_speed(&self) -> Option<u8> {
        self.attributes
            .get(Attribute::FanSpeed)
            .and_then(|raw| raw.trim().parse().ok())
    }

    /// Returns whether the fan is running.
    ///
    /// Only a raw level of exactly `"0"` reads as off.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.attributes
            .get(Attribute::FanSpeed)
            .map(|raw| raw != "0")
    }

    /// Gets the fan preset mode.
    ///
    /// `"manual"` means no preset is active and reads as `None`.
    // TODO: confirm with product whether "manual" should surface as a preset.
    #[must_use]
    pub fn fan_mode(&self) -> Option<&str> {
        self.attributes
            .get(Attribute::Mode)
            .filter(|mode| *mode != MANUAL_MODE)
    }

    /// Returns `true` if the device reports a mode attribute at all.
    #[must_use]
    pub fn fan_mode_supported(&self) -> bool {
        self.attributes.contains(Attribute::Mode)
    }

    // ========== Status ==========

    /// Gets the raw filter status.
    #[must_use]
    pub fn filter_status(&self) -> Option<&str> {
        self.attributes.get(Attribute::FilterStatus)
    }

    /// Returns `true` if the filter needs attention.
    #[must_use]
    pub fn filter_problem(&self) -> Option<bool> {
        self.filter_status().map(|status| status != FILTER_OK)
    }

    /// Gets the raw child lock value.
    #[must_use]
    pub fn child_lock(&self) -> Option<&str> {
        self.attributes.get(Attribute::ChildLock)
    }

    /// Returns the child lock flag.
    #[must_use]
    pub fn child_locked(&self) -> Option<bool> {
        self.child_lock().map(|raw| raw == CHILD_LOCK_LOCKED)
    }

    // ========== State Changes ==========

    /// Applies a state change and returns whether the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Information(information) => {
                replace_if_changed(&mut self.information, information)
            }
            StateChange::DataPoint(data_point) => {
                replace_if_changed(&mut self.data_point, data_point)
            }
            StateChange::Attributes(attributes) => {
                replace_if_changed(&mut self.attributes, attributes)
            }
            StateChange::Attribute { attribute, value } => {
                if self.attributes.get(*attribute) == Some(value.as_str()) {
                    false
                } else {
                    self.attributes.set(*attribute, value.clone());
                    true
                }
            }
            StateChange::Batch(changes) => {
                let mut any_changed = false;
                for c in changes {
                    if self.apply(c) {
                        any_changed = true;
                    }
                }
                any_changed
            }
        }
    }
}

/// Replaces `slot` with `value` when they differ.
fn replace_if_changed<T: Clone + PartialEq>(slot: &mut T, value: &T) -> bool {
    if slot == value {
        false
    } else {
        slot.clone_from(value);
        true
    }
}
