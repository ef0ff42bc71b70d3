//! # Installations
//!
//! An installation points at its meter by serial number only. Every write to
//! an installation re-applies the status mapping to that meter:
//!
//! | Installation | Meter                   |
//! |--------------|-------------------------|
//! | IN_TRANSIT   | ASSIGNED_TO_INSTALLER   |
//! | INSTALLED    | INSTALLED               |
//!
//! The meter write happens after the installation is stored. A missing meter
//! is logged and reported as `meterSynced: false`, the installation is kept.
use chrono::Utc;
use models::{
    Installation, InstallationStatus, Meter, User,
    payloads::{InstallationDraft, SyncStats},
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{database::Database, error::AppError};

/// Points the installation's meter at it. Returns false when no meter has
/// that serial number.
pub async fn sync_meter(
    database: &Database,
    installation: &Installation,
    installer_id: Option<&str>,
) -> Result<bool, AppError> {
    let serial = &installation.meter_serial_number;

    let Some(mut meter) = database.find_by_key::<Meter>(serial).await? else {
        warn!(
            event = "meter_sync_skipped",
            serial = %serial,
            installation = %installation.id,
            "No meter with this serial number"
        );
        return Ok(false);
    };

    meter.status = installation.status.meter_status();
    meter.installation_id = Some(installation.id.clone());
    if let Some(installer_id) = installer_id {
        meter.installer_id = Some(installer_id.to_string());
    }

    database.replace(&meter).await?;
    info!(serial = %serial, status = %meter.status, "Meter status updated");

    Ok(true)
}

pub async fn record_installation(
    database: &Database,
    installer: &User,
    draft: InstallationDraft,
) -> Result<(Installation, bool), AppError> {
    let now = Utc::now();
    let installation = Installation {
        id: Uuid::new_v4().to_string(),
        meter_serial_number: draft.meter_serial_number,
        installer_name: draft.installer_name,
        vendor_name: draft.vendor_name,
        consumer_name: draft.consumer_name,
        consumer_address: draft.consumer_address,
        gps_location: draft.gps_location,
        installation_date: draft.installation_date.unwrap_or(now),
        old_meter_reading: draft.old_meter_reading,
        new_meter_reading: draft.new_meter_reading,
        photos_before: draft.photos_before,
        photos_after: draft.photos_after,
        status: draft.status,
        created_at: now,
    };

    database.insert(&installation).await?;
    info!(
        serial = %installation.meter_serial_number,
        installer = %installation.installer_name,
        status = %installation.status,
        "Installation recorded"
    );

    let synced = sync_meter(database, &installation, Some(&installer.id)).await?;

    Ok((installation, synced))
}

pub async fn update_status(
    database: &Database,
    installer: &User,
    id: &str,
    status: InstallationStatus,
) -> Result<(Installation, bool), AppError> {
    let mut updated = database
        .get::<Installation>(id)
        .await?
        .ok_or(AppError::NotFound("Installation"))?;

    updated.status = status;
    database.replace(&updated).await?;

    let synced = sync_meter(database, &updated, Some(&installer.id)).await?;

    Ok((updated, synced))
}

/// Re-applies the status mapping for every installation. Running it twice in
/// a row gives the same stats and leaves the meters unchanged.
pub async fn sync_all(database: &Database) -> Result<SyncStats, AppError> {
    let installations = database.list::<Installation>().await?;
    let mut stats = SyncStats {
        total: installations.len() as u64,
        ..SyncStats::default()
    };

    for installation in &installations {
        match sync_meter(database, installation, None).await {
            Ok(true) => stats.updated += 1,
            Ok(false) => stats.failed += 1,
            Err(e) => {
                warn!(serial = %installation.meter_serial_number, error = %e, "Meter sync failed");
                stats.failed += 1;
            }
        }
    }

    info!(
        updated = stats.updated,
        failed = stats.failed,
        total = stats.total,
        "Meter statuses synced"
    );

    Ok(stats)
}

pub fn sync_message(stats: &SyncStats) -> String {
    format!("Synced {} meters, {} failed", stats.updated, stats.failed)
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallationQuery {
    pub status: Option<String>,
    pub installer_name: Option<String>,
    pub vendor_name: Option<String>,
    pub meter_serial_number: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InstallationFilter {
    pub status: Option<InstallationStatus>,
    pub installer_name: Option<String>,
    pub vendor_name: Option<String>,
    pub meter_serial_number: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl TryFrom<InstallationQuery> for InstallationFilter {
    type Error = AppError;

    fn try_from(query: InstallationQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: non_empty(query.status)
                .map(|status| status.parse::<InstallationStatus>())
                .transpose()?,
            installer_name: non_empty(query.installer_name),
            vendor_name: non_empty(query.vendor_name),
            meter_serial_number: non_empty(query.meter_serial_number),
        })
    }
}

impl InstallationFilter {
    pub fn matches(&self, installation: &Installation) -> bool {
        self.status.is_none_or(|status| installation.status == status)
            && self
                .installer_name
                .as_ref()
                .is_none_or(|name| &installation.installer_name == name)
            && self
                .vendor_name
                .as_ref()
                .is_none_or(|name| &installation.vendor_name == name)
            && self
                .meter_serial_number
                .as_ref()
                .is_none_or(|serial| &installation.meter_serial_number == serial)
    }
}

/// Matching installations, newest first.
pub async fn list_installations(
    database: &Database,
    filter: &InstallationFilter,
) -> Result<Vec<Installation>, AppError> {
    let mut installations: Vec<Installation> = database
        .list::<Installation>()
        .await?
        .into_iter()
        .filter(|installation| filter.matches(installation))
        .collect();

    installations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(installations)
}
