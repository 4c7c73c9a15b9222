// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory cloud used by the coordinator and hub tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use blueair_lib::error::{AuthError, Error, ProtocolError};
use blueair_lib::protocol::Api;
use blueair_lib::response::{Attribute, Attributes, DataPoint, Device, DeviceInformation};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// What the cloud holds for one device, and how it misbehaves.
#[derive(Debug, Clone, Default)]
pub struct Remote {
    pub information: DeviceInformation,
    pub data_point: Option<DataPoint>,
    pub attributes: Attributes,
    pub fail_info: bool,
    pub fail_attributes: bool,
    pub fail_set: bool,
    /// Accept writes without changing the stored value.
    pub ignore_writes: bool,
}

impl Remote {
    pub fn model(compatibility: &str) -> Self {
        Self {
            information: DeviceInformation {
                compatibility: Some(compatibility.to_string()),
                ..DeviceInformation::default()
            },
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes = self.attributes.with_raw(name, value);
        self
    }

    pub fn with_data_point(mut self, data_point: DataPoint) -> Self {
        self.data_point = Some(data_point);
        self
    }
}

/// Pauses `set_attribute` until released.
#[derive(Debug, Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Debug, Default)]
pub struct FakeApi {
    devices: Vec<Device>,
    remotes: Mutex<HashMap<String, Remote>>,
    calls: Mutex<Vec<String>>,
    info_delay: Mutex<Option<Duration>>,
    reject_login: bool,
    gate: Option<Arc<Gate>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, uuid: &str, name: &str, remote: Remote) -> Self {
        self.devices.push(Device::new(uuid, name));
        self.remotes.get_mut().insert(uuid.to_string(), remote);
        self
    }

    pub fn rejecting_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn device(&self, uuid: &str) -> Device {
        self.devices
            .iter()
            .find(|device| device.uuid == uuid)
            .cloned()
            .expect("unknown device")
    }

    /// Changes what the cloud holds for a device.
    pub fn update(&self, uuid: &str, f: impl FnOnce(&mut Remote)) {
        f(self.remotes.lock().get_mut(uuid).expect("unknown device"));
    }

    pub fn set_info_delay(&self, delay: Option<Duration>) {
        *self.info_delay.lock() = delay;
    }

    /// Calls made so far, as `"{method}:{uuid}"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&self, method: &str, uuid: &str) {
        self.calls.lock().push(format!("{method}:{uuid}"));
    }

    fn remote(&self, uuid: &str) -> Result<Remote, Error> {
        self.remotes
            .lock()
            .get(uuid)
            .cloned()
            .ok_or(Error::DeviceNotFound)
    }
}

fn unavailable(what: &str) -> Error {
    ProtocolError::Status {
        status: 500,
        message: what.to_string(),
    }
    .into()
}

impl Api for FakeApi {
    async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        self.record("list_devices", "");
        if self.reject_login {
            return Err(AuthError::Rejected.into());
        }
        Ok(self.devices.clone())
    }

    async fn get_info(&self, uuid: &str) -> Result<DeviceInformation, Error> {
        self.record("get_info", uuid);
        let delay = *self.info_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remote = self.remote(uuid)?;
        if remote.fail_info {
            return Err(unavailable("info"));
        }
        Ok(remote.information)
    }

    async fn get_data_point(&self, uuid: &str) -> Result<DataPoint, Error> {
        self.record("get_data_point", uuid);
        self.remote(uuid)?
            .data_point
            .ok_or_else(|| ProtocolError::Unsupported("telemetry".to_string()).into())
    }

    async fn get_attributes(&self, uuid: &str) -> Result<Attributes, Error> {
        self.record("get_attributes", uuid);
        let remote = self.remote(uuid)?;
        if remote.fail_attributes {
            return Err(unavailable("attributes"));
        }
        Ok(remote.attributes)
    }

    async fn set_attribute(
        &self,
        uuid: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), Error> {
        self.record("set_attribute", uuid);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut remotes = self.remotes.lock();
        let remote = remotes.get_mut(uuid).ok_or(Error::DeviceNotFound)?;
        if remote.fail_set {
            return Err(unavailable("set"));
        }
        if !remote.ignore_writes {
            remote.attributes.set(attribute, value);
        }
        Ok(())
    }
}
