// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed level type.
//!
//! Blueair purifiers expose their fan as a string-encoded level between
//! `"0"` (off) and `"3"` (maximum). Host platforms usually work with a
//! percentage, so [`FanSpeed`] converts in both directions.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Fan speed level (0-3).
///
/// # Examples
///
/// ```
/// use blueair_lib::types::FanSpeed;
///
/// let speed: FanSpeed = "2".parse().unwrap();
/// assert_eq!(speed.value(), 2);
/// assert_eq!(speed.to_percentage(), 67);
///
/// assert_eq!(FanSpeed::from_percentage(100), FanSpeed::MAX_SPEED);
/// assert!(FanSpeed::new(4).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FanSpeed(u8);

impl FanSpeed {
    /// Minimum level (fan off).
    pub const MIN: u8 = 0;

    /// Maximum level.
    pub const MAX: u8 = 3;

    /// Number of speeds a purifier supports, excluding off.
    pub const SPEED_COUNT: u8 = 3;

    /// Fan off.
    pub const OFF: Self = Self(0);

    /// Level used when the fan is turned on without an explicit speed.
    pub const DEFAULT_ON: Self = Self(2);

    /// Maximum speed.
    pub const MAX_SPEED: Self = Self(3);

    /// Creates a new fan speed.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [0, 3].
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > Self::MAX {
            return Err(ValueError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Maps a host percentage onto the nearest supported level.
    ///
    /// 100 and above is full speed, above 50 is level 2, above 20 is
    /// level 1, anything else turns the fan off.
    #[must_use]
    pub const fn from_percentage(percentage: u8) -> Self {
        if percentage >= 100 {
            Self(3)
        } else if percentage > 50 {
            Self(2)
        } else if percentage > 20 {
            Self(1)
        } else {
            Self(0)
        }
    }

    /// Returns the level as a percentage of full speed.
    #[must_use]
    pub fn to_percentage(self) -> u8 {
        // Safe: level is at most 3, so the result is at most 100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = (f64::from(self.0) * 33.33).round() as u8;
        percentage
    }

    /// Returns the level value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns `true` unless the fan is off.
    #[must_use]
    pub const fn is_on(self) -> bool {
        self.0 != 0
    }

    /// Returns the string form the API expects.
    #[must_use]
    pub fn as_api_value(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for FanSpeed {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| ValueError::InvalidFanSpeed(s.to_string()))?;
        Self::new(value)
    }
}
