// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Environmental telemetry response parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// Latest environmental readings of a device.
///
/// Every reading is optional: purifiers report only the sensors they carry,
/// and the legacy classic line reports none at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Carbon dioxide in ppm.
    pub co2: Option<f64>,
    /// Volatile organic compounds in ppb.
    pub voc: Option<f64>,
    /// PM1 in µg/m³.
    pub pm1: Option<f64>,
    /// PM10 in µg/m³.
    pub pm10: Option<f64>,
    /// PM2.5 in µg/m³.
    pub pm25: Option<f64>,
    /// Overall pollution index in percent.
    pub all_pollution: Option<f64>,
}

impl DataPoint {
    /// Sets the reading identified by a wire sensor key.
    ///
    /// Returns `false` for keys that do not map to a reading (`time` or
    /// sensors this library does not know).
    fn set_sensor(&mut self, key: &str, value: Option<f64>) -> bool {
        let slot = match key {
            "tmp" => &mut self.temperature,
            "hum" => &mut self.humidity,
            "co2" => &mut self.co2,
            "voc" => &mut self.voc,
            "pm1" => &mut self.pm1,
            "pm10" => &mut self.pm10,
            "pm" => &mut self.pm25,
            "allpollu" => &mut self.all_pollution,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Raw data point table as returned by `GET /device/{uuid}/datapoint/0/last/0/`.
///
/// The API sends a header row of sensor keys and one row of values per
/// sample:
///
/// ```json
/// {
///   "uuid": "0123abcd",
///   "sensors": ["time", "pm", "tmp", "hum", "co2", "voc", "allpollu"],
///   "datapoints": [[1700000000, 3, 21.4, 45.2, 612, 212, 14.0]]
/// }
/// ```
///
/// # Examples
///
/// ```
/// use blueair_lib::response::DataPointResponse;
///
/// let json = r#"{"sensors": ["time", "pm", "tmp"], "datapoints": [[1700000000, 3, 21.4]]}"#;
/// let response: DataPointResponse = serde_json::from_str(json).unwrap();
/// let data_point = response.into_latest().unwrap();
/// assert_eq!(data_point.pm25, Some(3.0));
/// assert_eq!(data_point.temperature, Some(21.4));
/// assert!(data_point.co2.is_none());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DataPointResponse {
    #[serde(default)]
    sensors: Vec<String>,
    #[serde(default)]
    datapoints: Vec<Vec<Value>>,
}

impl DataPointResponse {
    /// Converts the first sample row into a [`DataPoint`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response has no sample rows,
    /// which is what models without sensors send.
    pub fn into_latest(self) -> Result<DataPoint, ParseError> {
        let row = self
            .datapoints
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::MissingField("datapoints".to_string()))?;

        let mut data_point = DataPoint::default();
        for (key, value) in self.sensors.iter().zip(row.iter()) {
            if !data_point.set_sensor(key, reading(value)) {
                tracing::trace!(sensor = %key, "Ignoring sensor column");
            }
        }
        Ok(data_point)
    }
}

/// Reads a numeric cell, accepting numbers and numeric strings.
fn reading(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
