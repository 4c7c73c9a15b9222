// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registered device listing entry.

use serde::{Deserialize, Serialize};

/// A device registered to the account.
///
/// The listing also carries the owner id and MAC address, which are
/// ignored here; the device info endpoint is authoritative for those.
///
/// # Examples
///
/// ```
/// use blueair_lib::response::Device;
///
/// let json = r#"{"uuid": "0123abcd", "name": "Bedroom", "userId": 42}"#;
/// let device: Device = serde_json::from_str(json).unwrap();
/// assert_eq!(device.uuid, "0123abcd");
/// assert_eq!(device.name, "Bedroom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Vendor-assigned identifier.
    pub uuid: String,
    /// User-assigned name.
    #[serde(default)]
    pub name: String,
}

impl Device {
    /// Creates a device entry.
    #[must_use]
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }
}
