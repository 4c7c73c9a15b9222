// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::state::{DeviceState, StateChange};

use super::DeviceId;

/// Events emitted by coordinators and the hub.
///
/// # Examples
///
/// ```
/// use blueair_lib::event::{DeviceId, DeviceEvent};
///
/// let event = DeviceEvent::refresh_failed(DeviceId::new("abc"), "timed out");
/// assert!(event.is_failure());
/// assert_eq!(event.device_id().as_str(), "abc");
/// ```
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A device was found at setup and a coordinator created for it.
    DeviceAdded {
        /// The ID of the added device.
        device_id: DeviceId,
    },

    /// The cached state changed, from a refresh or an optimistic write.
    StateChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The change that was applied.
        change: StateChange,
        /// The complete new state of the device.
        new_state: DeviceState,
    },

    /// A refresh failed; the cached state was kept.
    RefreshFailed {
        /// The ID of the device.
        device_id: DeviceId,
        /// Description of the failure.
        error: String,
    },

    /// The device crossed the availability threshold in either direction.
    AvailabilityChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Whether the device is now available.
        available: bool,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceAdded { device_id }
            | Self::StateChanged { device_id, .. }
            | Self::RefreshFailed { device_id, .. }
            | Self::AvailabilityChanged { device_id, .. } => device_id,
        }
    }

    /// Returns `true` if this is a state change event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns `true` if this is a refresh failure event.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. })
    }

    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device_id: DeviceId) -> Self {
        Self::DeviceAdded { device_id }
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(device_id: DeviceId, change: StateChange, new_state: DeviceState) -> Self {
        Self::StateChanged {
            device_id,
            change,
            new_state,
        }
    }

    /// Creates a refresh failed event.
    #[must_use]
    pub fn refresh_failed(device_id: DeviceId, error: impl Into<String>) -> Self {
        Self::RefreshFailed {
            device_id,
            error: error.into(),
        }
    }

    /// Creates an availability changed event.
    #[must_use]
    pub fn availability_changed(device_id: DeviceId, available: bool) -> Self {
        Self::AvailabilityChanged {
            device_id,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Attribute;

    #[test]
    fn device_id_extraction() {
        let id = DeviceId::new("abc");

        assert_eq!(DeviceEvent::device_added(id.clone()).device_id(), &id);
        assert_eq!(
            DeviceEvent::availability_changed(id.clone(), false).device_id(),
            &id
        );
        assert_eq!(DeviceEvent::refresh_failed(id.clone(), "x").device_id(), &id);
    }

    #[test]
    fn state_change_events() {
        let id = DeviceId::new("abc");
        let change = StateChange::attribute(Attribute::FanSpeed, "1");
        let event = DeviceEvent::state_changed(id, change, DeviceState::new());

        assert!(event.is_state_change());
        assert!(!event.is_failure());
    }

    #[test]
    fn failure_events() {
        let event = DeviceEvent::refresh_failed(DeviceId::new("abc"), "boom");
        assert!(event.is_failure());
        let DeviceEvent::RefreshFailed { error, .. } = event else {
            panic!("expected failure");
        };
        assert_eq!(error, "boom");
    }
}
