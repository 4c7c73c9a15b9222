// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! Every mutation of a [`DeviceState`](super::DeviceState) goes through a
//! [`StateChange`]. A refresh produces one whole-group replacement per
//! successful fetch, grouped in a [`StateChange::Batch`] so the read model
//! never exposes a half-applied refresh. Commands produce a single
//! [`StateChange::Attribute`] for their optimistic write.
//!
//! # Examples
//!
//! ```
//! use blueair_lib::response::Attribute;
//! use blueair_lib::state::{DeviceState, StateChange};
//!
//! let mut state = DeviceState::new();
//!
//! let change = StateChange::attribute(Attribute::FanSpeed, "2");
//! assert!(state.apply(&change));
//! assert_eq!(state.fan_speed(), Some(2));
//!
//! // Applying the same change again reports no change
//! assert!(!state.apply(&change));
//! ```

use crate::response::{Attribute, Attributes, DataPoint, DeviceInformation};

/// Represents a change in device state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Device information replaced as a whole.
    Information(DeviceInformation),

    /// Telemetry replaced as a whole.
    DataPoint(DataPoint),

    /// Attributes replaced as a whole.
    Attributes(Attributes),

    /// A single attribute written ahead of remote confirmation.
    Attribute {
        /// The attribute written.
        attribute: Attribute,
        /// Its new raw value.
        value: String,
    },

    /// Multiple changes applied together.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Creates a single attribute change.
    #[must_use]
    pub fn attribute(attribute: Attribute, value: impl Into<String>) -> Self {
        Self::Attribute {
            attribute,
            value: value.into(),
        }
    }

    /// Builds the change a refresh applies.
    ///
    /// Information and attributes are always replaced; telemetry only when
    /// it was fetched.
    #[must_use]
    pub fn refresh(
        information: DeviceInformation,
        data_point: Option<DataPoint>,
        attributes: Attributes,
    ) -> Self {
        let mut changes = Vec::with_capacity(3);
        changes.push(Self::Information(information));
        if let Some(data_point) = data_point {
            changes.push(Self::DataPoint(data_point));
        }
        changes.push(Self::Attributes(attributes));
        Self::Batch(changes)
    }

    /// Returns `true` if this change is, or contains, a telemetry replacement.
    #[must_use]
    pub fn touches_data_point(&self) -> bool {
        match self {
            Self::DataPoint(_) => true,
            Self::Batch(changes) => changes.iter().any(Self::touches_data_point),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_with_data_point() {
        let change = StateChange::refresh(
            DeviceInformation::default(),
            Some(DataPoint::default()),
            Attributes::new(),
        );
        let StateChange::Batch(changes) = &change else {
            panic!("expected batch");
        };
        assert_eq!(changes.len(), 3);
        assert!(change.touches_data_point());
    }

    #[test]
    fn refresh_without_data_point() {
        let change = StateChange::refresh(DeviceInformation::default(), None, Attributes::new());
        let StateChange::Batch(changes) = &change else {
            panic!("expected batch");
        };
        assert_eq!(changes.len(), 2);
        assert!(!change.touches_data_point());
    }

    #[test]
    fn attribute_constructor() {
        let change = StateChange::attribute(Attribute::Mode, "auto");
        assert_eq!(
            change,
            StateChange::Attribute {
                attribute: Attribute::Mode,
                value: "auto".to_string()
            }
        );
    }
}
