// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account-wide device hub.
//!
//! The [`Hub`] enumerates the account's devices once, creates one
//! [`DeviceCoordinator`] per device, refreshes them all, and then keeps each
//! one fresh on its own timer until [`shutdown`](Hub::shutdown).
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use blueair_lib::coordinator::CoordinatorConfig;
//! use blueair_lib::hub::Hub;
//! use blueair_lib::protocol::HttpConfig;
//!
//! #[tokio::main]
//! async fn main() -> blueair_lib::Result<()> {
//!     let client = HttpConfig::new("me@example.com", "secret", "api-key")
//!         .into_client()?;
//!     let hub = Hub::setup(Arc::new(client), CoordinatorConfig::default()).await?;
//!
//!     for coordinator in hub.coordinators() {
//!         println!("{}: {:?}", coordinator.device_name(), coordinator.pm25());
//!     }
//!
//!     hub.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::coordinator::{CoordinatorConfig, DeviceCoordinator};
use crate::error::Error;
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::protocol::Api;
use crate::response::Device;

/// Owner of every coordinator of one account.
pub struct Hub<A> {
    config: CoordinatorConfig,
    coordinators: Vec<Arc<DeviceCoordinator<A>>>,
    event_bus: EventBus,
    shutdown_tx: watch::Sender<bool>,
    pollers: Mutex<Vec<JoinHandle<()>>>,
}

impl<A: Api + 'static> Hub<A> {
    /// Lists the account's devices, refreshes each once and starts polling.
    ///
    /// # Errors
    ///
    /// Returns the `list_devices` error, including `Error::Auth` when the
    /// credentials are rejected. Failed initial refreshes are logged and do
    /// not fail setup.
    pub async fn setup(api: Arc<A>, config: CoordinatorConfig) -> Result<Self, Error> {
        Self::setup_with_event_bus(api, config, EventBus::new()).await
    }

    /// Like [`setup`](Self::setup), publishing into an existing bus so
    /// subscribers see setup events too.
    ///
    /// # Errors
    ///
    /// Returns the `list_devices` error.
    pub async fn setup_with_event_bus(
        api: Arc<A>,
        config: CoordinatorConfig,
        event_bus: EventBus,
    ) -> Result<Self, Error> {
        let devices = api.list_devices().await?;
        tracing::info!(count = devices.len(), "Found devices");

        let hub = Self::with_devices(api, config, event_bus, devices);
        for (device_id, result) in hub.refresh_all().await {
            if let Err(error) = result {
                tracing::warn!(device = %device_id, %error, "Initial refresh failed");
            }
        }
        hub.start();

        Ok(hub)
    }

    /// Creates a hub for a known device list without fetching or polling.
    #[must_use]
    pub fn with_devices(
        api: Arc<A>,
        config: CoordinatorConfig,
        event_bus: EventBus,
        devices: Vec<Device>,
    ) -> Self {
        let coordinators = devices
            .into_iter()
            .map(|device| {
                let coordinator =
                    DeviceCoordinator::new(device, Arc::clone(&api), config.clone())
                        .with_event_bus(event_bus.clone());
                event_bus.publish(DeviceEvent::device_added(coordinator.id().clone()));
                Arc::new(coordinator)
            })
            .collect();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            coordinators,
            event_bus,
            shutdown_tx,
            pollers: Mutex::new(Vec::new()),
        }
    }

    /// Refreshes every device concurrently and reports each outcome.
    pub async fn refresh_all(&self) -> Vec<(DeviceId, Result<(), Error>)> {
        let mut tasks = JoinSet::new();
        for coordinator in &self.coordinators {
            let coordinator = Arc::clone(coordinator);
            tasks.spawn(async move {
                let result = coordinator.refresh().await;
                (coordinator.id().clone(), result)
            });
        }

        let mut outcomes = Vec::with_capacity(self.coordinators.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => tracing::error!(%error, "Refresh task panicked"),
            }
        }
        outcomes
    }

    /// Starts one polling task per device.
    ///
    /// Does nothing if polling is already running or the hub was shut down.
    pub fn start(&self) {
        if *self.shutdown_tx.borrow() {
            return;
        }
        let mut pollers = self.pollers.lock();
        if !pollers.is_empty() {
            return;
        }

        let period = self.config.update_interval();
        tracing::debug!(?period, "Starting pollers");
        pollers.extend(self.coordinators.iter().map(|coordinator| {
            spawn_poller(
                Arc::clone(coordinator),
                period,
                self.shutdown_tx.subscribe(),
            )
        }));
    }
}

impl<A> Hub<A> {
    /// Returns every coordinator.
    #[must_use]
    pub fn coordinators(&self) -> &[Arc<DeviceCoordinator<A>>] {
        &self.coordinators
    }

    /// Looks up a coordinator by device uuid.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if the account has no such device.
    pub fn coordinator(&self, uuid: &str) -> Result<&Arc<DeviceCoordinator<A>>, Error> {
        self.coordinators
            .iter()
            .find(|coordinator| coordinator.id().as_str() == uuid)
            .ok_or(Error::DeviceNotFound)
    }

    /// Returns the ids of every device.
    #[must_use]
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.coordinators
            .iter()
            .map(|coordinator| coordinator.id().clone())
            .collect()
    }

    /// Returns the number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    /// Returns `true` if the account has no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    /// Subscribes to events of every device.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Returns `true` while pollers are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pollers.lock().iter().any(|poller| !poller.is_finished())
    }

    /// Stops polling and waits for in-flight refreshes to finish.
    ///
    /// The hub cannot be restarted afterwards.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let pollers = std::mem::take(&mut *self.pollers.lock());

        for poller in pollers {
            if let Err(error) = poller.await {
                tracing::error!(%error, "Poller task failed");
            }
        }
        tracing::debug!("Hub stopped");
    }
}

impl<A> Drop for Hub<A> {
    fn drop(&mut self) {
        for poller in self.pollers.get_mut().drain(..) {
            poller.abort();
        }
    }
}

impl<A> fmt::Debug for Hub<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.config)
            .field("coordinators", &self.coordinators)
            .finish_non_exhaustive()
    }
}

fn spawn_poller<A: Api + 'static>(
    coordinator: Arc<DeviceCoordinator<A>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The initial refresh already ran; first tick is one period out
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    // Failures are recorded and logged by the coordinator
                    let _ = coordinator.refresh().await;
                }
            }
        }

        tracing::debug!(device = %coordinator.id(), "Poller stopped");
    })
}
