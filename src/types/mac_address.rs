// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware address normalization.

use std::fmt;

/// A MAC address in lowercase, colon-separated form.
///
/// The device info endpoint reports the address in whatever form the
/// firmware stored it. Colon, dash and dot separated forms as well as a
/// bare 12 character string are normalized to `aa:bb:cc:dd:ee:ff`. Input
/// in any other shape is kept verbatim.
///
/// # Examples
///
/// ```
/// use blueair_lib::types::MacAddress;
///
/// assert_eq!(MacAddress::normalize("AA-BB-CC-DD-EE-FF").as_str(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(MacAddress::normalize("aabb.ccdd.eeff").as_str(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(MacAddress::normalize("n/a").as_str(), "n/a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Normalizes a raw address string.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let separators = |c: char| raw.chars().filter(|&x| x == c).count();

        if raw.len() == 17 && separators(':') == 5 {
            return Self(raw.to_lowercase());
        }

        let compact = if raw.len() == 17 && separators('-') == 5 {
            raw.replace('-', "")
        } else if raw.len() == 14 && separators('.') == 2 {
            raw.replace('.', "")
        } else {
            raw.to_string()
        };

        if compact.len() != 12 || !compact.is_ascii() {
            return Self(raw.to_string());
        }

        let lower = compact.to_lowercase();
        let pairs: Vec<&str> = (0..12).step_by(2).map(|i| &lower[i..i + 2]).collect();
        Self(pairs.join(":"))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_form_is_lowercased() {
        assert_eq!(
            MacAddress::normalize("AA:BB:CC:DD:EE:FF").as_str(),
            "aa:bb:cc:dd:ee:ff"
        );
    }

    #[test]
    fn bare_form_gets_colons() {
        assert_eq!(
            MacAddress::normalize("A0B1C2D3E4F5").as_str(),
            "a0:b1:c2:d3:e4:f5"
        );
    }

    #[test]
    fn dash_and_dot_forms() {
        assert_eq!(
            MacAddress::normalize("a0-b1-c2-d3-e4-f5").as_str(),
            "a0:b1:c2:d3:e4:f5"
        );
        assert_eq!(
            MacAddress::normalize("A0B1.C2D3.E4F5").as_str(),
            "a0:b1:c2:d3:e4:f5"
        );
    }

    #[test]
    fn unknown_shape_kept_verbatim() {
        assert_eq!(MacAddress::normalize("Not-A-Mac").as_str(), "Not-A-Mac");
        assert_eq!(MacAddress::normalize("").as_str(), "");
    }
}
