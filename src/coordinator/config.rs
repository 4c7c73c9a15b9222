// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration.

use std::time::Duration;

/// Polling and health settings shared by every coordinator of a hub.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use blueair_lib::coordinator::CoordinatorConfig;
///
/// let config = CoordinatorConfig::default()
///     .with_update_interval(Duration::from_secs(120))
///     .with_unavailable_threshold(5);
///
/// assert_eq!(config.update_interval(), Duration::from_secs(120));
/// assert_eq!(config.refresh_timeout(), CoordinatorConfig::DEFAULT_REFRESH_TIMEOUT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    update_interval: Duration,
    refresh_timeout: Duration,
    unavailable_threshold: u32,
}

impl CoordinatorConfig {
    /// Time between scheduled refreshes.
    pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

    /// Upper bound on a single refresh.
    pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

    /// Consecutive failures after which a device reads as unavailable.
    pub const DEFAULT_UNAVAILABLE_THRESHOLD: u32 = 3;

    /// Shortest accepted time between scheduled refreshes.
    pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time between scheduled refreshes.
    ///
    /// Intervals shorter than [`MIN_UPDATE_INTERVAL`](Self::MIN_UPDATE_INTERVAL)
    /// are raised to it.
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval.max(Self::MIN_UPDATE_INTERVAL);
        self
    }

    /// Sets the upper bound on a single refresh.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Sets the number of consecutive failures that make a device unavailable.
    ///
    /// A threshold of 0 is treated as 1.
    #[must_use]
    pub fn with_unavailable_threshold(mut self, threshold: u32) -> Self {
        self.unavailable_threshold = threshold.max(1);
        self
    }

    /// Returns the time between scheduled refreshes.
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Returns the refresh bound.
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    /// Returns the unavailable threshold.
    #[must_use]
    pub fn unavailable_threshold(&self) -> u32 {
        self.unavailable_threshold
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: Self::DEFAULT_UPDATE_INTERVAL,
            refresh_timeout: Self::DEFAULT_REFRESH_TIMEOUT,
            unavailable_threshold: Self::DEFAULT_UNAVAILABLE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CoordinatorConfig::new();
        assert_eq!(config.update_interval(), Duration::from_secs(60));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(10));
        assert_eq!(config.unavailable_threshold(), 3);
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let config = CoordinatorConfig::new().with_unavailable_threshold(0);
        assert_eq!(config.unavailable_threshold(), 1);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = CoordinatorConfig::new().with_update_interval(Duration::ZERO);
        assert_eq!(config.update_interval(), Duration::from_secs(1));

        let config = CoordinatorConfig::new().with_update_interval(Duration::from_millis(250));
        assert_eq!(config.update_interval(), CoordinatorConfig::MIN_UPDATE_INTERVAL);
    }
}
