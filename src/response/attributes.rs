// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control attribute response parsing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Control-plane attributes the library reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// Fan level, `"0"` to `"3"`.
    FanSpeed,
    /// Operating mode, e.g. `"manual"` or `"auto"`.
    Mode,
    /// Filter health, `"OK"` when healthy.
    FilterStatus,
    /// Child lock setting.
    ChildLock,
}

impl Attribute {
    /// Returns the attribute name used in payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FanSpeed => "fan_speed",
            Self::Mode => "mode",
            Self::FilterStatus => "filter_status",
            Self::ChildLock => "child_lock",
        }
    }

    /// Returns the URL path segment used to set the attribute.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::FanSpeed => "fanspeed",
            Self::Mode => "mode",
            Self::FilterStatus => "filterstatus",
            Self::ChildLock => "childlock",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the `GET /device/{uuid}/attributes/` list.
///
/// ```json
/// [{"name": "fan_speed", "currentValue": "1", "defaultValue": "1", "scope": "device"}]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeEntry {
    /// Attribute name.
    pub name: String,
    /// Current value; usually a string, occasionally a number or bool.
    #[serde(default)]
    pub current_value: Value,
}

/// Raw attribute values keyed by name.
///
/// Values stay in the string form the API uses; the read model interprets
/// them. Key presence is meaningful on its own (a device that reports a
/// `mode` key supports modes), so every attribute returned is kept.
/// Serializes back to the same `[{name, currentValue}]` list it is read from.
///
/// # Examples
///
/// ```
/// use blueair_lib::response::{Attribute, Attributes};
///
/// let json = r#"[
///     {"name": "fan_speed", "currentValue": "2"},
///     {"name": "mode", "currentValue": "auto"}
/// ]"#;
/// let attributes: Attributes = serde_json::from_str(json).unwrap();
/// assert_eq!(attributes.get(Attribute::FanSpeed), Some("2"));
/// assert!(attributes.contains(Attribute::Mode));
/// assert!(!attributes.contains(Attribute::ChildLock));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a known attribute.
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.get_raw(attribute.name())
    }

    /// Returns the raw value of any attribute by name.
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if the attribute key is present.
    #[must_use]
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.0.contains_key(attribute.name())
    }

    /// Sets an attribute value, returning the previous one.
    pub fn set(&mut self, attribute: Attribute, value: impl Into<String>) -> Option<String> {
        self.0.insert(attribute.name().to_string(), value.into())
    }

    /// Sets an attribute value by name.
    #[must_use]
    pub fn with_raw(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no attributes are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<AttributeEntry> for Attributes {
    fn from_iter<I: IntoIterator<Item = AttributeEntry>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|entry| (entry.name, value_to_string(entry.current_value)))
                .collect(),
        )
    }
}

impl Serialize for Attributes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|(name, value)| AttributeEntry {
            name: name.clone(),
            current_value: Value::String(value.clone()),
        }))
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<AttributeEntry>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// Converts a JSON value into the API's string encoding.
fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
