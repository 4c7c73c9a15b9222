// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Blueair library.
//!
//! This module provides the error hierarchy used across the library:
//! authentication, protocol communication, response parsing, value
//! validation and refresh timeouts.

use std::time::Duration;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication with the Blueair cloud failed.
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A refresh did not complete within its time bound.
    #[error("refresh timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Device was not found in the hub.
    #[error("device not found")]
    DeviceNotFound,
}

impl Error {
    /// Returns `true` if this error means the credentials or session are invalid.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Errors raised while obtaining or renewing the access token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The cloud rejected the username or password.
    #[error("credentials rejected")]
    Rejected,

    /// The login response did not carry a token.
    #[error("login response did not contain an auth token")]
    MissingToken,

    /// The home host lookup failed.
    #[error("home host lookup failed: {0}")]
    HomeHost(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u8,
        /// Maximum allowed value.
        max: u8,
        /// The actual value that was provided.
        actual: u8,
    },

    /// A fan speed string could not be parsed as a level.
    #[error("invalid fan speed: {0}")]
    InvalidFanSpeed(String),

    /// An account region code is not known.
    #[error("unknown region: {0}")]
    InvalidRegion(String),
}

/// Errors related to protocol communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Canonical reason or response excerpt.
        message: String,
    },

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The operation is not supported by this device.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Errors related to parsing Blueair responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 3,
            actual: 7,
        };
        assert_eq!(err.to_string(), "value 7 is out of range [0, 3]");
    }

    #[test]
    fn error_from_auth_error() {
        let err: Error = AuthError::Rejected.into();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "authorization failed: credentials rejected");
    }

    #[test]
    fn timeout_display() {
        let err = Error::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "refresh timed out after 10000 ms");
        assert!(!err.is_auth());
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("datapoints".to_string());
        assert_eq!(err.to_string(), "missing field in response: datapoints");
    }

    #[test]
    fn protocol_status_display() {
        let err = ProtocolError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected HTTP status 503: Service Unavailable"
        );
    }
}
