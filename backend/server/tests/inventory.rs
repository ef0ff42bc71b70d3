mod common;

use client::{ApiClient, ClientError, ClientStore};
use common::TestServer;
use models::{
    InstallationStatus, MeterStatus, Role,
    payloads::{ErrorResponse, GpsInput, InstallationInput, SyncStats, VendorInput},
};
use reqwest::StatusCode;

fn installation(serial: &str, status: InstallationStatus) -> InstallationInput {
    InstallationInput {
        meter_serial_number: Some(serial.to_string()),
        installer_name: Some("Rajesh Kumar".to_string()),
        vendor_name: Some("PowerGrid Corp".to_string()),
        consumer_name: Some("Sunita Devi".to_string()),
        consumer_address: Some("12 MG Road, Delhi".to_string()),
        gps_location: Some(GpsInput {
            latitude: Some(28.6139),
            longitude: Some(77.209),
        }),
        new_meter_reading: Some("0000".to_string()),
        status: Some(status),
        ..InstallationInput::default()
    }
}

async fn meter_status(client: &ApiClient, serial: &str) -> MeterStatus {
    client
        .meters(None, None)
        .await
        .unwrap()
        .into_iter()
        .find(|meter| meter.serial_number == serial)
        .map(|meter| meter.status)
        .unwrap()
}

#[tokio::test]
async fn test_assign_first_batch() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let vendor_id = server.vendor(&admin, "PowerGrid Corp").await;

    let assignment = admin.assign_meters(&vendor_id, 5).await.unwrap();

    assert_eq!(assignment.assigned_count, 5);
    let serials: Vec<_> = assignment
        .meters
        .iter()
        .map(|meter| meter.serial_number.as_str())
        .collect();
    assert_eq!(
        serials,
        ["MTR-00001", "MTR-00002", "MTR-00003", "MTR-00004", "MTR-00005"]
    );
    assert!(
        assignment
            .meters
            .iter()
            .all(|meter| meter.status == MeterStatus::Available)
    );

    assert_eq!(admin.vendor(&vendor_id).await.unwrap().assigned_meters_count, 5);

    let stats = admin.meter_stats().await.unwrap();
    assert_eq!(stats.total_meters, 5);
    assert_eq!(stats.balance_count, 5);
    assert_eq!(stats.vendors[0].vendor_name, "PowerGrid Corp");

    let available = admin
        .meters(Some(MeterStatus::Available), Some(&vendor_id))
        .await
        .unwrap();
    assert_eq!(available.len(), 5);
}

#[tokio::test]
async fn test_assign_validation() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let vendor_id = server.vendor(&admin, "PowerGrid Corp").await;

    let err = admin.assign_meters(&vendor_id, 0).await.unwrap_err();
    assert_eq!(err.to_string(), "Quantity must be at least 1");

    let err = admin.assign_meters(&vendor_id, 1001).await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = admin.assign_meters("missing", 3).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 404, ref message } if message == "Vendor not found"
    ));

    assert!(admin.meters(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_installation_status_sync() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let vendor_id = server.vendor(&admin, "PowerGrid Corp").await;
    admin.assign_meters(&vendor_id, 5).await.unwrap();

    let installer = server
        .account(&admin, "rajesh", Role::Installer, None)
        .await;

    let created = installer
        .create_installation(&installation("MTR-00001", InstallationStatus::InTransit))
        .await
        .unwrap();
    assert!(created.meter_synced);
    assert_eq!(created.data.status, InstallationStatus::InTransit);
    assert_eq!(
        meter_status(&admin, "MTR-00001").await,
        MeterStatus::AssignedToInstaller
    );

    let updated = installer
        .update_installation_status(&created.data.id, InstallationStatus::Installed)
        .await
        .unwrap();
    assert!(updated.meter_synced);
    assert_eq!(
        meter_status(&admin, "MTR-00001").await,
        MeterStatus::Installed
    );

    let fetched = admin.installation(&created.data.id).await.unwrap();
    assert_eq!(fetched.status, InstallationStatus::Installed);
}

#[tokio::test]
async fn test_installation_without_meter() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let created = admin
        .create_installation(&installation("MTR-04040", InstallationStatus::Installed))
        .await
        .unwrap();

    assert!(!created.meter_synced);
    assert_eq!(admin.installations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_installation_validation() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let mut input = installation("MTR-00001", InstallationStatus::InTransit);
    input.new_meter_reading = None;
    let err = admin.create_installation(&input).await.unwrap_err();
    assert_eq!(err.to_string(), "New meter reading is required");

    let mut input = installation("MTR-00001", InstallationStatus::InTransit);
    input.gps_location = Some(GpsInput {
        latitude: Some(95.0),
        longitude: Some(77.2),
    });
    let err = admin.create_installation(&input).await.unwrap_err();
    assert_eq!(err.to_string(), "Latitude must be between -90 and 90");

    let err = admin
        .update_installation_status("missing", InstallationStatus::Installed)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_status_required() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let created = admin
        .create_installation(&installation("MTR-00001", InstallationStatus::InTransit))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .put(server.url(&format!("/installations/{}", created.data.id)))
        .bearer_auth(admin.token().unwrap())
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Status is required");
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let vendor_id = server.vendor(&admin, "PowerGrid Corp").await;
    admin.assign_meters(&vendor_id, 2).await.unwrap();

    admin
        .create_installation(&installation("MTR-00001", InstallationStatus::Installed))
        .await
        .unwrap();
    admin
        .create_installation(&installation("MTR-00002", InstallationStatus::InTransit))
        .await
        .unwrap();
    admin
        .create_installation(&installation("MTR-09999", InstallationStatus::InTransit))
        .await
        .unwrap();

    let first = admin.sync_meter_statuses().await.unwrap();
    let meters = admin.meters(None, None).await.unwrap();
    let second = admin.sync_meter_statuses().await.unwrap();

    let expected = SyncStats {
        updated: 2,
        failed: 1,
        total: 3,
    };
    assert_eq!(first.stats, expected);
    assert_eq!(second.stats, expected);
    assert_eq!(first.message, "Synced 2 meters, 1 failed");
    assert_eq!(meters, admin.meters(None, None).await.unwrap());
}

#[tokio::test]
async fn test_installation_filters() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    admin
        .create_installation(&installation("MTR-00001", InstallationStatus::InTransit))
        .await
        .unwrap();
    admin
        .create_installation(&installation("MTR-00002", InstallationStatus::Installed))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .get(server.url("/installations?status=INSTALLED"))
        .bearer_auth(admin.token().unwrap())
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["meterSerialNumber"], "MTR-00002");

    let response = reqwest::Client::new()
        .get(server.url("/installations?status=PENDING"))
        .bearer_auth(admin.token().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vendor_uniqueness() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    server.vendor(&admin, "PowerGrid Corp").await;
    let other = server.vendor(&admin, "Energy Plus").await;

    let duplicate = VendorInput {
        name: Some("PowerGrid Corp".to_string()),
        ..VendorInput::default()
    };
    let err = admin.create_vendor(&duplicate).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Vendor \"PowerGrid Corp\" already exists. Please choose a different name."
    );

    let err = admin.update_vendor(&other, &duplicate).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Vendor name \"PowerGrid Corp\" is already taken. Please choose a different name."
    );

    admin.delete_vendor(&other).await.unwrap();
    assert_eq!(admin.delete_vendor(&other).await.unwrap_err().status(), Some(404));
    assert_eq!(admin.vendors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_vendor_sees_own_meters_only() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let own = server.vendor(&admin, "PowerGrid Corp").await;
    let other = server.vendor(&admin, "Energy Plus").await;
    admin.assign_meters(&own, 2).await.unwrap();
    admin.assign_meters(&other, 3).await.unwrap();

    let vendor = server
        .account(&admin, "powergrid", Role::Vendor, Some(&own))
        .await;

    assert_eq!(vendor.vendor_meters(&own).await.unwrap().len(), 2);
    assert_eq!(vendor.vendor_meters(&other).await.unwrap_err().status(), Some(403));
    assert_eq!(admin.vendor_meters(&other).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_store_flow() {
    let server = TestServer::start().await;
    let mut store = ClientStore::new(server.client());
    store.login("admin", common::ADMIN_PASSWORD).await.unwrap();

    let vendor = store
        .create_vendor(&VendorInput {
            name: Some("PowerGrid Corp".to_string()),
            ..VendorInput::default()
        })
        .await
        .unwrap();
    assert_eq!(store.assign_meters(&vendor.id, 3).await.unwrap(), 3);
    assert_eq!(store.stock().balance_count, 3);

    let response = store
        .record_installation(&installation("MTR-00002", InstallationStatus::InTransit))
        .await
        .unwrap();
    assert!(response.meter_synced);

    let stock = store.stock();
    assert_eq!(stock.assigned_meters, 1);
    assert_eq!(stock.in_transit_meters, 1);
    assert_eq!(stock.balance_count, 2);

    store.refresh().await.unwrap();
    assert_eq!(store.stock(), stock);
    assert_eq!(store.vendors[0].assigned_meters_count, 3);

    assert!(store.assign_meters(&vendor.id, 0).await.is_err());
    assert_eq!(store.error.as_deref(), Some("Quantity must be at least 1"));
    store.dismiss_error();
    assert!(store.error.is_none());
}
