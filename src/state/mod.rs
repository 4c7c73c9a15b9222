// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! [`DeviceState`] is the read model a coordinator caches for one device.
//! [`StateChange`] describes the mutations that can be applied to it.
//!
//! # Examples
//!
//! ```
//! use blueair_lib::response::DataPoint;
//! use blueair_lib::state::{DeviceState, StateChange};
//!
//! let mut state = DeviceState::new();
//! assert_eq!(state.temperature(), None);
//!
//! let data_point = DataPoint { temperature: Some(21.5), ..DataPoint::default() };
//! state.apply(&StateChange::DataPoint(data_point));
//!
//! assert_eq!(state.temperature(), Some(21.5));
//! ```

mod device_state;
mod state_change;

pub use device_state::DeviceState;
pub use state_change::StateChange;
