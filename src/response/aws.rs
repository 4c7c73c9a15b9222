// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for the AWS-hosted device API.
//!
//! Newer purifiers report everything in one `initial` document: identity
//! under `configuration.di`, control state as a list of named `states`, and
//! telemetry as a list of named `sensordata` readings. The conversions here
//! project that document onto the same [`DeviceInformation`], [`DataPoint`]
//! and [`Attributes`] groups the classic API returns.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::response::{Attribute, Attributes, DataPoint, DeviceInformation};
use crate::types::FanSpeed;

/// Filter usage, in percent, from which the filter reads as worn out.
pub const FILTER_USAGE_LIMIT: f64 = 100.0;

/// `GET /registered-devices` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredDevices {
    /// Devices bound to the account.
    #[serde(default)]
    pub devices: Vec<RegisteredDevice>,
}

/// One registered device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredDevice {
    /// Vendor-assigned identifier.
    pub uuid: String,
    /// Device name; also the path segment of the `initial` query.
    #[serde(default)]
    pub name: String,
    /// Raw MAC address.
    #[serde(default)]
    pub mac: Option<String>,
}

/// `POST /{name}/r/initial` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialResponse {
    /// One entry per queried device.
    #[serde(default)]
    pub device_info: Vec<AwsDeviceInfo>,
}

impl InitialResponse {
    /// Takes the entry of `uuid`, or the only entry when ids are missing.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response has no entries.
    pub fn into_device(self, uuid: &str) -> Result<AwsDeviceInfo, ParseError> {
        let mut entries = self.device_info;
        let position = entries.iter().position(|entry| entry.id == uuid);
        match position {
            Some(index) => Ok(entries.swap_remove(index)),
            None => entries
                .into_iter()
                .next()
                .ok_or_else(|| ParseError::MissingField("deviceInfo".to_string())),
        }
    }
}

/// A named state or sensor reading.
///
/// Numeric readings carry `v`, boolean ones carry `vb`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    /// Reading name.
    pub n: String,
    /// Numeric value.
    #[serde(default)]
    pub v: Option<Value>,
    /// Boolean value.
    #[serde(default)]
    pub vb: Option<bool>,
}

impl Reading {
    fn number(&self) -> Option<f64> {
        match self.v.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Identity block of the `initial` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceIdentity {
    /// User-assigned name.
    #[serde(default)]
    pub name: Option<String>,
    /// Product code, used as the model identifier.
    #[serde(default)]
    pub sku: Option<String>,
    /// Connectivity firmware version.
    #[serde(default)]
    pub cfv: Option<String>,
    /// MCU firmware version.
    #[serde(default)]
    pub mfv: Option<String>,
}

/// Device configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    /// Identity.
    #[serde(default)]
    pub di: DeviceIdentity,
}

/// One device of the `initial` document.
///
/// # Examples
///
/// ```
/// use blueair_lib::response::{Attribute, AwsDeviceInfo};
///
/// let json = r#"{
///     "id": "0123abcd",
///     "configuration": {"di": {"name": "Office", "sku": "112000", "cfv": "2.1.1"}},
///     "states": [{"n": "fanspeed", "v": 67}, {"n": "automode", "vb": false}],
///     "sensordata": [{"n": "pm2_5", "v": 4}, {"n": "t", "v": 21.5}]
/// }"#;
/// let info: AwsDeviceInfo = serde_json::from_str(json).unwrap();
///
/// assert_eq!(info.information(None).compatibility.as_deref(), Some("112000"));
/// assert_eq!(info.attributes().get(Attribute::FanSpeed), Some("2"));
/// assert_eq!(info.data_point().unwrap().pm25, Some(4.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AwsDeviceInfo {
    /// Device identifier.
    #[serde(default)]
    pub id: String,
    /// Static configuration.
    #[serde(default)]
    pub configuration: Configuration,
    /// Control state.
    #[serde(default)]
    pub states: Vec<Reading>,
    /// Latest telemetry.
    #[serde(default)]
    pub sensordata: Vec<Reading>,
}

impl AwsDeviceInfo {
    /// Projects the identity block onto [`DeviceInformation`].
    ///
    /// The document carries no MAC address; the one from the device
    /// listing is passed in.
    #[must_use]
    pub fn information(&self, mac: Option<&str>) -> DeviceInformation {
        let di = &self.configuration.di;
        DeviceInformation {
            nickname: di.name.clone(),
            compatibility: di.sku.clone(),
            room_location: None,
            firmware: di.cfv.clone().or_else(|| di.mfv.clone()),
            mac: mac.map(str::to_string),
        }
    }

    /// Converts the sensor readings into a [`DataPoint`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the device reports no sensor
    /// data.
    pub fn data_point(&self) -> Result<DataPoint, ParseError> {
        if self.sensordata.is_empty() {
            return Err(ParseError::MissingField("sensordata".to_string()));
        }

        let mut data_point = DataPoint::default();
        for reading in &self.sensordata {
            let slot = match reading.n.as_str() {
                "t" => &mut data_point.temperature,
                "h" => &mut data_point.humidity,
                "co2" => &mut data_point.co2,
                "tVOC" | "voc" => &mut data_point.voc,
                "pm1" => &mut data_point.pm1,
                "pm10" => &mut data_point.pm10,
                "pm2_5" => &mut data_point.pm25,
                _ => {
                    tracing::trace!(sensor = %reading.n, "Ignoring sensor reading");
                    continue;
                }
            };
            *slot = reading.number();
        }
        Ok(data_point)
    }

    /// Converts the control states into classic [`Attributes`].
    ///
    /// `fanspeed` (percent) becomes a 0-3 level and standby reads as level
    /// 0. `automode` becomes `mode`, `childlock` becomes `child_lock` with
    /// `"0"` for locked, and `filterusage` becomes `filter_status`. States
    /// the device does not report stay absent.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        let state = |name: &str| self.states.iter().find(|reading| reading.n == name);
        let mut attributes = Attributes::new();

        let standby = state("standby").and_then(|reading| reading.vb);
        let percentage = state("fanspeed").and_then(Reading::number);
        match (standby, percentage) {
            (Some(true), _) => {
                attributes.set(Attribute::FanSpeed, FanSpeed::OFF.as_api_value());
            }
            (_, Some(percentage)) => {
                attributes.set(Attribute::FanSpeed, level_for(percentage).as_api_value());
            }
            _ => {}
        }

        if let Some(auto) = state("automode").and_then(|reading| reading.vb) {
            attributes.set(Attribute::Mode, if auto { "auto" } else { "manual" });
        }
        if let Some(locked) = state("childlock").and_then(|reading| reading.vb) {
            attributes.set(Attribute::ChildLock, if locked { "0" } else { "1" });
        }
        if let Some(usage) = state("filterusage").and_then(Reading::number) {
            let status = if usage >= FILTER_USAGE_LIMIT { "WARN" } else { "OK" };
            attributes.set(Attribute::FilterStatus, status);
        }

        attributes
    }
}

fn level_for(percentage: f64) -> FanSpeed {
    // Clamped to [0, 100] first, so the cast cannot truncate
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percentage = percentage.clamp(0.0, 100.0).round() as u8;
    FanSpeed::from_percentage(percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(states: Value, sensordata: Value) -> AwsDeviceInfo {
        serde_json::from_value(serde_json::json!({
            "id": "d1",
            "states": states,
            "sensordata": sensordata,
        }))
        .unwrap()
    }

    #[test]
    fn registered_devices_parse() {
        let json = r#"{"devices": [
            {"uuid": "d1", "name": "Office", "mac": "A0B1C2D3E4F5", "type": "foo"},
            {"uuid": "d2"}
        ]}"#;
        let listing: RegisteredDevices = serde_json::from_str(json).unwrap();

        assert_eq!(listing.devices.len(), 2);
        assert_eq!(listing.devices[0].mac.as_deref(), Some("A0B1C2D3E4F5"));
        assert_eq!(listing.devices[1].name, "");
    }

    #[test]
    fn initial_picks_matching_entry() {
        let json = r#"{"deviceInfo": [{"id": "other"}, {"id": "d1"}]}"#;
        let response: InitialResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_device("d1").unwrap().id, "d1");

        let empty: InitialResponse = serde_json::from_str(r#"{"deviceInfo": []}"#).unwrap();
        assert!(matches!(
            empty.into_device("d1"),
            Err(ParseError::MissingField(_))
        ));
    }

    #[test]
    fn information_falls_back_to_mcu_firmware() {
        let info: AwsDeviceInfo = serde_json::from_value(serde_json::json!({
            "configuration": {"di": {"name": "Office", "mfv": "1.0.2"}}
        }))
        .unwrap();

        let information = info.information(Some("a0b1c2d3e4f5"));
        assert_eq!(information.nickname.as_deref(), Some("Office"));
        assert_eq!(information.firmware.as_deref(), Some("1.0.2"));
        assert_eq!(information.mac.as_deref(), Some("a0b1c2d3e4f5"));
        assert!(information.compatibility.is_none());
    }

    #[test]
    fn sensor_readings_map_to_data_point() {
        let info = device(
            serde_json::json!([]),
            serde_json::json!([
                {"n": "pm1", "v": 1},
                {"n": "pm2_5", "v": 3},
                {"n": "pm10", "v": 5},
                {"n": "t", "v": 22.4},
                {"n": "h", "v": "41"},
                {"n": "tVOC", "v": 120},
                {"n": "fsp0", "v": 9}
            ]),
        );
        let data_point = info.data_point().unwrap();

        assert_eq!(data_point.pm1, Some(1.0));
        assert_eq!(data_point.pm25, Some(3.0));
        assert_eq!(data_point.pm10, Some(5.0));
        assert_eq!(data_point.temperature, Some(22.4));
        assert_eq!(data_point.humidity, Some(41.0));
        assert_eq!(data_point.voc, Some(120.0));
        assert!(data_point.co2.is_none());
        assert!(data_point.all_pollution.is_none());
    }

    #[test]
    fn no_sensor_data_is_an_error() {
        let info = device(serde_json::json!([]), serde_json::json!([]));
        assert!(matches!(info.data_point(), Err(ParseError::MissingField(_))));
    }

    #[test]
    fn states_map_to_attributes() {
        let info = device(
            serde_json::json!([
                {"n": "fanspeed", "v": 100},
                {"n": "standby", "vb": false},
                {"n": "automode", "vb": true},
                {"n": "childlock", "vb": true},
                {"n": "filterusage", "v": 42},
                {"n": "nightmode", "vb": false}
            ]),
            serde_json::json!([]),
        );
        let attributes = info.attributes();

        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes.get(Attribute::FanSpeed), Some("3"));
        assert_eq!(attributes.get(Attribute::Mode), Some("auto"));
        assert_eq!(attributes.get(Attribute::ChildLock), Some("0"));
        assert_eq!(attributes.get(Attribute::FilterStatus), Some("OK"));
    }

    #[test]
    fn standby_reads_as_off() {
        let info = device(
            serde_json::json!([
                {"n": "fanspeed", "v": 67},
                {"n": "standby", "vb": true}
            ]),
            serde_json::json!([]),
        );
        assert_eq!(info.attributes().get(Attribute::FanSpeed), Some("0"));
    }

    #[test]
    fn worn_filter_and_unlocked_child_lock() {
        let info = device(
            serde_json::json!([
                {"n": "filterusage", "v": 100},
                {"n": "childlock", "vb": false},
                {"n": "automode", "vb": false}
            ]),
            serde_json::json!([]),
        );
        let attributes = info.attributes();

        assert_eq!(attributes.get(Attribute::FilterStatus), Some("WARN"));
        assert_eq!(attributes.get(Attribute::ChildLock), Some("1"));
        assert_eq!(attributes.get(Attribute::Mode), Some("manual"));
        assert!(!attributes.contains(Attribute::FanSpeed));
    }

    #[test]
    fn fan_percentages_round_to_levels() {
        assert_eq!(level_for(0.0), FanSpeed::OFF);
        assert_eq!(level_for(33.0).value(), 1);
        assert_eq!(level_for(67.0).value(), 2);
        assert_eq!(level_for(150.0), FanSpeed::MAX_SPEED);
        assert_eq!(level_for(-5.0), FanSpeed::OFF);
    }
}
