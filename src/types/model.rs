// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device model identifier.

use std::fmt;

/// Model identifier of a Blueair device.
///
/// The identifier comes from the `compatibility` field of the device info,
/// falling back to the device UUID when the cloud does not report one. It
/// decides which entities make sense for the device: the legacy classic
/// line (except the `i` variants) and the Foobot monitor have neither
/// environmental sensors nor a controllable fan.
///
/// # Examples
///
/// ```
/// use blueair_lib::types::Model;
///
/// assert!(Model::new("classic_480i").supports_sensors());
/// assert!(!Model::new("classic_280").supports_sensors());
/// assert!(!Model::new("foobot").supports_fan());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Model(String);

impl Model {
    /// Prefix shared by the legacy classic line.
    pub const CLASSIC_PREFIX: &'static str = "classic";

    /// Identifier of the Foobot air quality monitor.
    pub const FOOBOT: &'static str = "foobot";

    /// Creates a model from its identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for classic models without the trailing `i`.
    #[must_use]
    pub fn is_legacy_classic(&self) -> bool {
        self.0.starts_with(Self::CLASSIC_PREFIX) && !self.0.ends_with('i')
    }

    /// Returns `true` for the Foobot monitor.
    #[must_use]
    pub fn is_foobot(&self) -> bool {
        self.0 == Self::FOOBOT
    }

    /// Returns `true` if sensor and binary sensor entities apply.
    #[must_use]
    pub fn supports_sensors(&self) -> bool {
        !self.is_legacy_classic() && !self.is_foobot()
    }

    /// Returns `true` if a fan entity applies.
    #[must_use]
    pub fn supports_fan(&self) -> bool {
        self.supports_sensors()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_i_is_exempt() {
        let model = Model::new("classic_i");
        assert!(!model.is_legacy_classic());
        assert!(model.supports_sensors());
        assert!(model.supports_fan());
    }

    #[test]
    fn legacy_classic_has_no_entities() {
        let model = Model::new("classic_250");
        assert!(model.is_legacy_classic());
        assert!(!model.supports_sensors());
        assert!(!model.supports_fan());
    }

    #[test]
    fn foobot_has_no_entities() {
        let model = Model::new("foobot");
        assert!(model.is_foobot());
        assert!(!model.supports_sensors());
        assert!(!model.supports_fan());
    }

    #[test]
    fn other_models_supported() {
        assert!(Model::new("sense+").supports_sensors());
        assert!(Model::new("foobot_2").supports_fan());
        // "classic" must be a prefix, not a substring
        assert!(Model::new("hepa_classic").supports_sensors());
    }
}
