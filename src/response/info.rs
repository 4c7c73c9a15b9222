// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device information response parsing.

use serde::{Deserialize, Serialize};

/// Static and semi-static device metadata.
///
/// Blueair returns this from `GET /device/{uuid}/info/`. The payload holds
/// more fields (calibration dates, brightness, WLAN driver and so on); only
/// the ones the library uses are kept.
///
/// # Examples
///
/// ```
/// use blueair_lib::response::DeviceInformation;
///
/// let json = r#"{
///     "uuid": "0123abcd",
///     "nickname": "Living Room",
///     "compatibility": "classic_480i",
///     "roomLocation": "living",
///     "firmware": "1.0.5",
///     "mac": "A0B1C2D3E4F5",
///     "brightness": "4"
/// }"#;
/// let info: DeviceInformation = serde_json::from_str(json).unwrap();
/// assert_eq!(info.compatibility.as_deref(), Some("classic_480i"));
/// assert_eq!(info.room_location.as_deref(), Some("living"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInformation {
    /// Display name override.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Model identifier.
    #[serde(default)]
    pub compatibility: Option<String>,
    /// Room the device is placed in.
    #[serde(default)]
    pub room_location: Option<String>,
    /// Firmware version.
    #[serde(default)]
    pub firmware: Option<String>,
    /// Raw MAC address as reported.
    #[serde(default)]
    pub mac: Option<String>,
}
