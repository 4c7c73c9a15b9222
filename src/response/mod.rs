// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types returned by the Blueair cloud API.
//!
//! These are the three groups of device data a coordinator caches, plus the
//! device listing entry. Each group is fetched by its own API call and is
//! always replaced as a whole. The [`aws`] module projects the single
//! document of the AWS-hosted API onto the same groups.

mod attributes;
pub mod aws;
mod data_point;
mod device;
mod info;

pub use attributes::{Attribute, AttributeEntry, Attributes};
pub use aws::AwsDeviceInfo;
pub use data_point::{DataPoint, DataPointResponse};
pub use device::Device;
pub use info::DeviceInformation;
