// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::sync::Arc;

/// Identifier of a Blueair device.
///
/// Wraps the vendor-assigned UUID. The cloud treats it as an opaque string,
/// so no format is assumed. Cloning is cheap.
///
/// # Examples
///
/// ```
/// use blueair_lib::event::DeviceId;
///
/// let id = DeviceId::new("0123abcd-ef45");
/// assert_eq!(id.as_str(), "0123abcd-ef45");
/// assert_eq!(id.to_string(), "0123abcd-ef45");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Creates an identifier from a vendor UUID.
    #[must_use]
    pub fn new(uuid: impl AsRef<str>) -> Self {
        Self(Arc::from(uuid.as_ref()))
    }

    /// Returns the UUID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(uuid: &str) -> Self {
        Self::new(uuid)
    }
}

impl From<String> for DeviceId {
    fn from(uuid: String) -> Self {
        Self(Arc::from(uuid))
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_by_value() {
        let id1 = DeviceId::new("abc");
        let id2 = DeviceId::from("abc".to_string());
        assert_eq!(id1, id2);
        assert_ne!(id1, DeviceId::new("abd"));
    }

    #[test]
    fn debug_format() {
        let id = DeviceId::new("abc");
        assert_eq!(format!("{id:?}"), "DeviceId(abc)");
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let id = DeviceId::new("abc");
        set.insert(id.clone());
        assert!(set.contains(&id));
    }
}
