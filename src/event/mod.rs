// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for device refreshes and state changes.
//!
//! Coordinators publish a [`DeviceEvent`] whenever their cached state
//! changes, a refresh fails, or the device's availability flips. The
//! [`EventBus`] fans these out to any number of subscribers over a tokio
//! broadcast channel.
//!
//! # Examples
//!
//! ```
//! use blueair_lib::event::{DeviceId, DeviceEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::device_added(DeviceId::new("0123abcd")));
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::EventBus;
