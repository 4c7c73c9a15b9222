// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Blueair device control.
//!
//! The Blueair API encodes most values as strings. These types give the
//! commonly used ones a checked, typed form.
//!
//! # Types
//!
//! - [`FanSpeed`] - Fan level (0-3) with percentage conversion
//! - [`MacAddress`] - Normalized, colon-separated hardware address
//! - [`Model`] - Model identifier with capability gating

mod fan_speed;
mod mac_address;
mod model;

pub use fan_speed::FanSpeed;
pub use mac_address::MacAddress;
pub use model::Model;
