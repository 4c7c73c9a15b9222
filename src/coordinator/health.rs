// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Refresh outcome tracking.

use chrono::{DateTime, Utc};

/// Outcome history of a coordinator's refreshes.
///
/// Failures never blank cached values; they only count towards the
/// unavailable threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshHealth {
    last_update_success: bool,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_success_at: Option<DateTime<Utc>>,
}

impl RefreshHealth {
    /// Creates an empty history; no refresh has run yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the most recent refresh succeeded.
    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    /// Returns the number of failures since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns the message of the most recent failure.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns when the last successful refresh completed.
    #[must_use]
    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    /// Returns `true` once a refresh succeeded and fewer than `threshold`
    /// refreshes have failed since.
    #[must_use]
    pub fn is_available(&self, threshold: u32) -> bool {
        self.last_success_at.is_some() && self.consecutive_failures < threshold
    }

    /// Records a successful refresh.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_update_success = true;
        self.consecutive_failures = 0;
        self.last_success_at = Some(at);
    }

    /// Records a failed refresh.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_update_success = false;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_until_first_success() {
        let mut health = RefreshHealth::new();
        assert!(!health.is_available(3));

        health.record_failure("boom");
        assert!(!health.is_available(3));
        assert_eq!(health.last_error(), Some("boom"));

        health.record_success(Utc::now());
        assert!(health.is_available(3));
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn threshold_counts_consecutive_failures() {
        let mut health = RefreshHealth::new();
        health.record_success(Utc::now());

        health.record_failure("a");
        health.record_failure("b");
        assert!(health.is_available(3));
        assert!(!health.last_update_success());

        health.record_failure("c");
        assert!(!health.is_available(3));
        assert_eq!(health.consecutive_failures(), 3);
        assert!(health.last_success_at().is_some());
    }
}
