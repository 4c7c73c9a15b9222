// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `blueair_lib` - Polling adapter for Blueair air purifiers.
//!
//! This library keeps a cached, typed view of every purifier on a Blueair
//! account and exposes it to a host home-automation platform.
//!
//! # Components
//!
//! - **[`protocol`]**: the [`Api`](protocol::Api) capability trait and the
//!   [`HttpClient`](protocol::HttpClient) and
//!   [`AwsClient`](protocol::AwsClient) that implement it against the
//!   classic and AWS-hosted Blueair clouds
//! - **[`coordinator`]**: one [`DeviceCoordinator`] per device; refreshes,
//!   caches and runs optimistic commands
//! - **[`state`]**: the read model and the changes applied to it
//! - **[`entity`]**: descriptor tables for sensors, binary sensors and fans
//! - **[`hub`]**: device enumeration and periodic polling
//! - **[`event`]**: broadcast of state changes and refresh failures
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use blueair_lib::{CoordinatorConfig, HttpConfig, Hub};
//!
//! #[tokio::main]
//! async fn main() -> blueair_lib::Result<()> {
//!     let client = HttpConfig::new("me@example.com", "secret", "api-key")
//!         .into_client()?;
//!     let hub = Hub::setup(Arc::new(client), CoordinatorConfig::default()).await?;
//!
//!     let coordinator = &hub.coordinators()[0];
//!     println!("{} is on: {:?}", coordinator.device_name(), coordinator.is_on());
//!
//!     // Readable immediately, confirmed by the trailing refresh
//!     coordinator.set_fan_speed("3").await?;
//!     assert_eq!(coordinator.fan_speed(), Some(3));
//!
//!     hub.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Watching State
//!
//! ```no_run
//! use blueair_lib::{DeviceCoordinator, protocol::Api};
//!
//! # async fn example<A: Api>(coordinator: &DeviceCoordinator<A>) {
//! let mut rx = coordinator.watch();
//! while rx.changed().await.is_ok() {
//!     println!("PM2.5: {:?}", rx.borrow().pm25());
//! }
//! # }
//! ```

pub mod coordinator;
pub mod entity;
pub mod error;
pub mod event;
pub mod hub;
pub mod protocol;
pub mod response;
pub mod state;
pub mod types;

pub use coordinator::{CoordinatorConfig, DeviceCoordinator, RefreshHealth};
pub use error::{AuthError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use hub::Hub;
pub use protocol::Api;
#[cfg(feature = "http")]
pub use protocol::{AwsClient, AwsConfig, AwsRegion, HttpClient, HttpConfig};
pub use state::{DeviceState, StateChange};
pub use types::{FanSpeed, MacAddress, Model};
