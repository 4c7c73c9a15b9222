// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity descriptor tables for host platform adapters.
//!
//! A host adapter does not need one type per sensor. It iterates
//! [`entities_for`] once per device and renders each [`Entity`] from the
//! coordinator's [`DeviceState`]. The tables below carry everything that
//! differs between entities: key, display name, device class, unit, icon,
//! precision and the accessor that reads the value.
//!
//! # Examples
//!
//! ```
//! use blueair_lib::entity::{Entity, entities_for};
//! use blueair_lib::state::DeviceState;
//! use blueair_lib::types::Model;
//!
//! let entities = entities_for(&Model::new("classic_480i"), "0123abcd", "Bedroom");
//! let state = DeviceState::new();
//!
//! for entity in &entities {
//!     if let Entity::Sensor(sensor) = entity {
//!         // Nothing fetched yet
//!         assert_eq!(sensor.native_value(&state), None);
//!     }
//! }
//! ```

use std::fmt;

use crate::state::DeviceState;
use crate::types::{FanSpeed, Model};

/// Sensor device classes understood by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorDeviceClass {
    /// Temperature.
    Temperature,
    /// Relative humidity.
    Humidity,
    /// Carbon dioxide concentration.
    Co2,
    /// Volatile organic compounds, in parts.
    VolatileOrganicCompoundsParts,
    /// Particulate matter below 1 µm.
    Pm1,
    /// Particulate matter below 10 µm.
    Pm10,
    /// Particulate matter below 2.5 µm.
    Pm25,
}

impl SensorDeviceClass {
    /// Returns the host platform identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Co2 => "carbon_dioxide",
            Self::VolatileOrganicCompoundsParts => "volatile_organic_compounds_parts",
            Self::Pm1 => "pm1",
            Self::Pm10 => "pm10",
            Self::Pm25 => "pm25",
        }
    }
}

impl fmt::Display for SensorDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary sensor device classes understood by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySensorDeviceClass {
    /// On means a problem was detected.
    Problem,
    /// On means unlocked in the host's vocabulary.
    Lock,
}

impl BinarySensorDeviceClass {
    /// Returns the host platform identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Lock => "lock",
        }
    }
}

impl fmt::Display for BinarySensorDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a numeric sensor.
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    /// Stable key, also the entity name suffix.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Host device class, if any.
    pub device_class: Option<SensorDeviceClass>,
    /// Native unit of measurement.
    pub unit: &'static str,
    /// Icon override.
    pub icon: Option<&'static str>,
    /// Number of decimals reported.
    pub precision: u8,
    /// Reads the raw value from the cached state.
    pub value: fn(&DeviceState) -> Option<f64>,
}

impl SensorDescription {
    /// Returns the value rounded to the sensor's precision.
    #[must_use]
    pub fn native_value(&self, state: &DeviceState) -> Option<f64> {
        (self.value)(state).map(|value| round_to(value, self.precision))
    }
}

/// Static description of a binary sensor.
#[derive(Debug, Clone, Copy)]
pub struct BinarySensorDescription {
    /// Stable key, also the entity name suffix.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Host device class.
    pub device_class: BinarySensorDeviceClass,
    /// Icon override.
    pub icon: &'static str,
    /// Reads the flag from the cached state.
    pub is_on: fn(&DeviceState) -> Option<bool>,
}

/// Sensors exposed by devices that report telemetry.
pub const SENSORS: &[SensorDescription] = &[
    SensorDescription {
        key: "temperature",
        name: "Temperature",
        device_class: Some(SensorDeviceClass::Temperature),
        unit: "°C",
        icon: None,
        precision: 1,
        value: DeviceState::temperature,
    },
    SensorDescription {
        key: "humidity",
        name: "Humidity",
        device_class: Some(SensorDeviceClass::Humidity),
        unit: "%",
        icon: None,
        precision: 0,
        value: DeviceState::humidity,
    },
    SensorDescription {
        key: "co2",
        name: "CO2",
        device_class: Some(SensorDeviceClass::Co2),
        unit: "ppm",
        icon: None,
        precision: 0,
        value: DeviceState::co2,
    },
    SensorDescription {
        key: "voc",
        name: "VOC",
        device_class: Some(SensorDeviceClass::VolatileOrganicCompoundsParts),
        unit: "ppb",
        icon: None,
        precision: 0,
        value: DeviceState::voc,
    },
    SensorDescription {
        key: "all_pollution",
        name: "All Pollution",
        device_class: None,
        unit: "%",
        icon: Some("mdi:molecule"),
        precision: 0,
        value: DeviceState::all_pollution,
    },
    SensorDescription {
        key: "pm1",
        name: "PM1",
        device_class: Some(SensorDeviceClass::Pm1),
        unit: "µg/m³",
        icon: None,
        precision: 0,
        value: DeviceState::pm1,
    },
    SensorDescription {
        key: "pm10",
        name: "PM10",
        device_class: Some(SensorDeviceClass::Pm10),
        unit: "µg/m³",
        icon: None,
        precision: 0,
        value: DeviceState::pm10,
    },
    SensorDescription {
        key: "pm25",
        name: "PM2.5",
        device_class: Some(SensorDeviceClass::Pm25),
        unit: "µg/m³",
        icon: None,
        precision: 0,
        value: DeviceState::pm25,
    },
];

/// Binary sensors exposed by devices that report telemetry.
pub const BINARY_SENSORS: &[BinarySensorDescription] = &[
    BinarySensorDescription {
        key: "filter_status",
        name: "Filter Status",
        device_class: BinarySensorDeviceClass::Problem,
        icon: "mdi:air-filter",
        is_on: DeviceState::filter_problem,
    },
    BinarySensorDescription {
        key: "child_lock",
        name: "Child Lock",
        device_class: BinarySensorDeviceClass::Lock,
        icon: "mdi:lock",
        is_on: DeviceState::child_locked,
    },
];

/// Preset modes offered when the device reports a mode attribute.
pub const PRESET_MODES: &[&str] = &["auto"];

/// Features a fan entity advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanFeatures {
    /// Speed can be set by percentage.
    pub set_speed: bool,
    /// Preset modes can be selected.
    pub preset_mode: bool,
}

/// A numeric sensor bound to one device.
#[derive(Debug, Clone)]
pub struct SensorEntity {
    /// Unique id, `{uuid}_{key}`.
    pub unique_id: String,
    /// Entity name, `{device_name}_{key}`.
    pub name: String,
    /// The sensor's static description.
    pub description: &'static SensorDescription,
}

impl SensorEntity {
    /// Returns the rounded value, `None` when unknown.
    #[must_use]
    pub fn native_value(&self, state: &DeviceState) -> Option<f64> {
        self.description.native_value(state)
    }
}

/// A binary sensor bound to one device.
#[derive(Debug, Clone)]
pub struct BinarySensorEntity {
    /// Unique id, `{uuid}_{key}`.
    pub unique_id: String,
    /// Entity name, `{device_name}_{key}`.
    pub name: String,
    /// The binary sensor's static description.
    pub description: &'static BinarySensorDescription,
}

impl BinarySensorEntity {
    /// Returns the flag, `None` when unknown.
    #[must_use]
    pub fn is_on(&self, state: &DeviceState) -> Option<bool> {
        (self.description.is_on)(state)
    }
}

/// The fan entity of one device.
#[derive(Debug, Clone)]
pub struct FanEntity {
    /// Unique id, `{uuid}_fan`.
    pub unique_id: String,
    /// Entity name, `{device_name}_fan`.
    pub name: String,
}

impl FanEntity {
    /// Number of discrete speeds.
    pub const SPEED_COUNT: u8 = FanSpeed::SPEED_COUNT;

    /// Returns whether the fan is running.
    #[must_use]
    pub fn is_on(&self, state: &DeviceState) -> Option<bool> {
        state.is_on()
    }

    /// Returns the speed as a percentage; 0 when unknown.
    #[must_use]
    pub fn percentage(&self, state: &DeviceState) -> u8 {
        state.fan_speed().map_or(0, level_to_percentage)
    }

    /// Returns the active preset, only on devices that support modes.
    #[must_use]
    pub fn preset_mode<'a>(&self, state: &'a DeviceState) -> Option<&'a str> {
        if state.fan_mode_supported() {
            state.fan_mode()
        } else {
            None
        }
    }

    /// Returns the selectable presets, only on devices that support modes.
    #[must_use]
    pub fn preset_modes(&self, state: &DeviceState) -> Option<&'static [&'static str]> {
        state.fan_mode_supported().then_some(PRESET_MODES)
    }

    /// Returns the features the fan advertises for the current state.
    #[must_use]
    pub fn supported_features(&self, state: &DeviceState) -> FanFeatures {
        FanFeatures {
            set_speed: true,
            preset_mode: state.fan_mode_supported(),
        }
    }
}

/// One entity a host adapter should create.
#[derive(Debug, Clone)]
pub enum Entity {
    /// Numeric sensor.
    Sensor(SensorEntity),
    /// Binary sensor.
    BinarySensor(BinarySensorEntity),
    /// Fan control.
    Fan(FanEntity),
}

impl Entity {
    /// Returns the entity's unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Sensor(entity) => &entity.unique_id,
            Self::BinarySensor(entity) => &entity.unique_id,
            Self::Fan(entity) => &entity.unique_id,
        }
    }

    /// Returns the entity's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor(entity) => &entity.name,
            Self::BinarySensor(entity) => &entity.name,
            Self::Fan(entity) => &entity.name,
        }
    }
}

/// Lists the entities a device of `model` exposes.
///
/// Legacy classic models and Foobot report neither telemetry nor a fan and
/// get no entities at all.
#[must_use]
pub fn entities_for(model: &Model, uuid: &str, device_name: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    if model.supports_sensors() {
        entities.extend(SENSORS.iter().map(|description| {
            Entity::Sensor(SensorEntity {
                unique_id: format!("{uuid}_{}", description.key),
                name: format!("{device_name}_{}", description.key),
                description,
            })
        }));
        entities.extend(BINARY_SENSORS.iter().map(|description| {
            Entity::BinarySensor(BinarySensorEntity {
                unique_id: format!("{uuid}_{}", description.key),
                name: format!("{device_name}_{}", description.key),
                description,
            })
        }));
    }

    if model.supports_fan() {
        entities.push(Entity::Fan(FanEntity {
            unique_id: format!("{uuid}_fan"),
            name: format!("{device_name}_fan"),
        }));
    }

    entities
}

/// Levels outside the typed range still render; the device is the authority.
fn level_to_percentage(level: u8) -> u8 {
    FanSpeed::new(level).map_or(100, FanSpeed::to_percentage)
}

fn round_to(value: f64, precision: u8) -> f64 {
    let factor = 10_f64.powi(i32::from(precision));
    (value * factor).round() / factor
}
