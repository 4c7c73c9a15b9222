// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub setup, entity gating and polling against an in-memory cloud.

mod common;

use std::sync::Arc;
use std::time::Duration;

use blueair_lib::coordinator::CoordinatorConfig;
use blueair_lib::entity::Entity;
use blueair_lib::event::{DeviceEvent, EventBus};
use blueair_lib::hub::Hub;
use blueair_lib::{AuthError, Error};

use common::{FakeApi, Remote};

fn account() -> FakeApi {
    FakeApi::new()
        .with_device(
            "d1",
            "Bedroom",
            Remote::model("classic_480i")
                .with_attribute("fan_speed", "2")
                .with_attribute("mode", "auto"),
        )
        .with_device(
            "d2",
            "Hallway",
            Remote::model("classic_250").with_attribute("fan_speed", "1"),
        )
        .with_device("d3", "Kitchen", Remote::model("foobot"))
}

#[tokio::test]
async fn setup_refreshes_every_device() {
    let api = Arc::new(account());
    let hub = Hub::setup(Arc::clone(&api), CoordinatorConfig::default())
        .await
        .unwrap();

    assert_eq!(hub.len(), 3);
    assert_eq!(api.count("list_devices:"), 1);
    for uuid in ["d1", "d2", "d3"] {
        assert_eq!(api.count(&format!("get_info:{uuid}")), 1);
        assert!(hub.coordinator(uuid).unwrap().is_available());
    }
    assert!(hub.is_running());

    hub.shutdown().await;
    assert!(!hub.is_running());
}

#[tokio::test]
async fn entities_are_gated_by_model() {
    let hub = Hub::setup(Arc::new(account()), CoordinatorConfig::default())
        .await
        .unwrap();

    let sensor_model = hub.coordinator("d1").unwrap().entities();
    assert_eq!(sensor_model.len(), 11);
    assert!(
        sensor_model
            .iter()
            .any(|entity| matches!(entity, Entity::Fan(_)))
    );
    assert!(
        sensor_model
            .iter()
            .any(|entity| entity.unique_id() == "d1_temperature")
    );

    assert!(hub.coordinator("d2").unwrap().entities().is_empty());
    assert!(hub.coordinator("d3").unwrap().entities().is_empty());

    hub.shutdown().await;
}

#[tokio::test]
async fn unknown_device_lookup() {
    let hub = Hub::with_devices(
        Arc::new(account()),
        CoordinatorConfig::default(),
        EventBus::new(),
        Vec::new(),
    );

    assert!(hub.is_empty());
    assert!(matches!(hub.coordinator("d1"), Err(Error::DeviceNotFound)));
}

#[tokio::test]
async fn rejected_credentials_fail_setup() {
    let result = Hub::setup(
        Arc::new(account().rejecting_login()),
        CoordinatorConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(Error::Auth(AuthError::Rejected))));
}

#[tokio::test]
async fn failed_initial_refresh_does_not_block_setup() {
    let api = account();
    api.update("d2", |remote| remote.fail_attributes = true);
    let hub = Hub::setup(Arc::new(api), CoordinatorConfig::default())
        .await
        .unwrap();

    assert!(hub.coordinator("d1").unwrap().is_available());
    let failed = hub.coordinator("d2").unwrap();
    assert!(!failed.is_available());
    assert_eq!(failed.fan_speed(), None);
    assert!(failed.health().last_error().is_some());

    hub.shutdown().await;
}

#[tokio::test]
async fn setup_events_reach_early_subscribers() {
    let bus = EventBus::new();
    let mut events = bus.subscribe();

    let hub = Hub::setup_with_event_bus(Arc::new(account()), CoordinatorConfig::default(), bus)
        .await
        .unwrap();

    let mut added = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let DeviceEvent::DeviceAdded { device_id } = event {
            added.push(device_id.to_string());
        }
    }
    assert_eq!(added, ["d1", "d2", "d3"]);

    hub.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn pollers_refresh_on_interval() {
    let api = Arc::new(account());
    let config = CoordinatorConfig::default().with_update_interval(Duration::from_secs(60));
    let hub = Hub::setup(Arc::clone(&api), config).await.unwrap();
    assert_eq!(api.count("get_info:d1"), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(api.count("get_info:d1"), 2);
    assert_eq!(api.count("get_info:d3"), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.count("get_info:d2"), 3);

    hub.shutdown().await;
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(api.count("get_info:d1"), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_keeps_polling() {
    let api = Arc::new(account());
    let config = CoordinatorConfig::default().with_update_interval(Duration::ZERO);
    let hub = Hub::setup(Arc::clone(&api), config).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(hub.is_running());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(hub.is_running());
    assert!(api.count("get_info:d1") >= 2);

    hub.shutdown().await;
}

#[tokio::test]
async fn refresh_all_reports_each_device() {
    let api = Arc::new(account());
    api.update("d3", |remote| remote.fail_info = true);
    let hub = Hub::with_devices(
        Arc::clone(&api),
        CoordinatorConfig::default(),
        EventBus::new(),
        vec![api.device("d1"), api.device("d3")],
    );

    let mut outcomes = hub.refresh_all().await;
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].1.is_ok());
    assert!(outcomes[1].1.is_err());
    // Nothing polls a hub that was never started
    assert!(!hub.is_running());
}
