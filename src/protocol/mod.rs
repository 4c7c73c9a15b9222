// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote API access for Blueair devices.
//!
//! The [`Api`] trait is the capability surface the rest of the library
//! depends on. [`HttpClient`] implements it against the classic Blueair
//! cloud and [`AwsClient`] against the AWS-hosted API of newer devices;
//! tests and alternative transports can provide their own implementation.
//!
//! # Authentication
//!
//! All requests made through one client share a single [`TokenCell`].
//! The token is renewed lazily when it expires and concurrent callers never
//! renew more than once. A rejection only discards the token that was
//! refused.

#[cfg(feature = "http")]
mod aws;
#[cfg(feature = "http")]
mod http;
mod token;

#[cfg(feature = "http")]
pub use aws::{AwsClient, AwsConfig, AwsRegion};
#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};
pub use token::TokenCell;

use std::future::Future;

use crate::error::Error;
use crate::response::{Attribute, Attributes, DataPoint, Device, DeviceInformation};

/// Capability interface of the Blueair cloud.
///
/// Every method may fail; callers decide which failures matter. In
/// particular [`get_data_point`](Api::get_data_point) is expected to fail
/// on models that have no sensors.
pub trait Api: Send + Sync {
    /// Lists the devices registered to the account.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected, or another
    /// error if the request fails.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    /// Fetches device information.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    fn get_info(
        &self,
        uuid: &str,
    ) -> impl Future<Output = Result<DeviceInformation, Error>> + Send;

    /// Fetches the latest telemetry sample.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the response cannot be parsed,
    /// or the device does not report telemetry.
    fn get_data_point(&self, uuid: &str) -> impl Future<Output = Result<DataPoint, Error>> + Send;

    /// Fetches the control attributes.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    fn get_attributes(&self, uuid: &str)
    -> impl Future<Output = Result<Attributes, Error>> + Send;

    /// Writes a control attribute.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn set_attribute(
        &self,
        uuid: &str,
        attribute: Attribute,
        value: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}
