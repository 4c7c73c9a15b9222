// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device polling and caching.
//!
//! A [`DeviceCoordinator`] owns the cached [`DeviceState`](crate::state::DeviceState)
//! of one purifier. It refreshes that state from the [`Api`](crate::protocol::Api)
//! when asked, serves synchronous accessors from the cache, and runs control
//! commands as an optimistic local write followed by the remote call and a
//! forced refresh.
//!
//! Refreshes and commands of one device never overlap: both hold the
//! coordinator's exclusive lock for their whole duration. Different devices
//! share nothing.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use blueair_lib::coordinator::{CoordinatorConfig, DeviceCoordinator};
//! use blueair_lib::protocol::HttpConfig;
//! use blueair_lib::response::Device;
//!
//! # async fn example() -> blueair_lib::Result<()> {
//! let client = HttpConfig::new("me@example.com", "secret", "api-key")
//!     .into_client()?;
//! let device = Device::new("0123abcd", "Bedroom");
//! let coordinator =
//!     DeviceCoordinator::new(device, Arc::new(client), CoordinatorConfig::default());
//!
//! coordinator.refresh().await?;
//! println!("PM2.5: {:?}", coordinator.pm25());
//!
//! coordinator.set_fan_speed("2").await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod device_coordinator;
mod health;

pub use config::CoordinatorConfig;
pub use device_coordinator::DeviceCoordinator;
pub use health::RefreshHealth;
