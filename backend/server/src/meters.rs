//! # Meter Stock
//!
//! Serial numbers are `MTR-` plus a zero padded counter. The next number is
//! derived from the highest existing suffix when an assignment starts, so two
//! concurrent assignments can pick the same range. The serial index in the
//! store rejects the loser's colliding inserts.
use std::sync::LazyLock;

use chrono::Utc;
use models::{Meter, MeterStats, MeterStatus, User, Vendor, payloads::Assignment};
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{database::Database, error::AppError};

pub static SERIAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^MTR-(\d+)$").expect("serial pattern compiles"));

pub fn format_serial(number: u64) -> String {
    format!("MTR-{number:05}")
}

pub fn serial_suffix(serial: &str) -> Option<u64> {
    SERIAL_PATTERN
        .captures(serial)
        .and_then(|captures| captures.get(1))
        .and_then(|suffix| suffix.as_str().parse().ok())
}

/// Highest suffix among well formed serials, 0 for an empty stock.
pub fn highest_serial<'a>(meters: impl IntoIterator<Item = &'a Meter>) -> u64 {
    meters
        .into_iter()
        .filter_map(|meter| serial_suffix(&meter.serial_number))
        .max()
        .unwrap_or(0)
}

pub async fn next_serial_number(database: &Database) -> Result<u64, AppError> {
    let meters = database.list::<Meter>().await?;

    Ok(highest_serial(&meters) + 1)
}

/// Creates `quantity` fresh meters for the vendor and bumps its counter.
///
/// Inserts are sequential and not rolled back: if one fails the meters written
/// before it stay. The counter is a separate write after all inserts.
pub async fn assign_meters(
    database: &Database,
    admin: &User,
    vendor_id: &str,
    quantity: u64,
) -> Result<Assignment, AppError> {
    let vendor = database
        .get::<Vendor>(vendor_id)
        .await?
        .ok_or(AppError::NotFound("Vendor"))?;

    let first = next_serial_number(database).await?;
    let now = Utc::now();
    let mut meters = Vec::with_capacity(quantity as usize);

    for number in first..first + quantity {
        let meter = Meter {
            id: Uuid::new_v4().to_string(),
            serial_number: format_serial(number),
            vendor_id: Some(vendor.id.clone()),
            vendor_name: Some(vendor.name.clone()),
            status: MeterStatus::Available,
            assigned_by: Some(admin.id.clone()),
            assigned_date: Some(now),
            installer_id: None,
            installation_id: None,
            created_at: now,
        };

        database.insert(&meter).await?;
        meters.push(meter);
    }

    // Re-read so a rename since the first read is not reverted.
    let mut counted = database.get::<Vendor>(vendor_id).await?.unwrap_or(vendor);
    counted.assigned_meters_count += quantity;
    database.replace(&counted).await?;

    info!(
        vendor = %counted.name,
        quantity,
        first = %format_serial(first),
        admin = %admin.username,
        "Meters assigned"
    );

    Ok(Assignment {
        assigned_count: quantity,
        meters,
    })
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeterQuery {
    pub status: Option<String>,
    pub vendor_id: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeterFilter {
    pub status: Option<MeterStatus>,
    pub vendor_id: Option<String>,
}

impl TryFrom<MeterQuery> for MeterFilter {
    type Error = AppError;

    fn try_from(query: MeterQuery) -> Result<Self, Self::Error> {
        let status = query
            .status
            .filter(|status| !status.is_empty())
            .map(|status| status.parse::<MeterStatus>())
            .transpose()?;

        Ok(Self {
            status,
            vendor_id: query.vendor_id.filter(|id| !id.is_empty()),
        })
    }
}

impl MeterFilter {
    pub fn matches(&self, meter: &Meter) -> bool {
        self.status.is_none_or(|status| meter.status == status)
            && self
                .vendor_id
                .as_ref()
                .is_none_or(|vendor_id| meter.vendor_id.as_ref() == Some(vendor_id))
    }
}

/// Matching meters in serial order, by number so `MTR-100000` follows
/// `MTR-99999`.
pub async fn list_meters(database: &Database, filter: &MeterFilter) -> Result<Vec<Meter>, AppError> {
    let mut meters: Vec<Meter> = database
        .list::<Meter>()
        .await?
        .into_iter()
        .filter(|meter| filter.matches(meter))
        .collect();

    meters.sort_by(|a, b| {
        serial_suffix(&a.serial_number)
            .cmp(&serial_suffix(&b.serial_number))
            .then_with(|| a.serial_number.cmp(&b.serial_number))
    });

    Ok(meters)
}

pub async fn meter_stats(database: &Database) -> Result<MeterStats, AppError> {
    let meters = database.list::<Meter>().await?;
    let vendors = database.list::<Vendor>().await?;

    Ok(MeterStats::from_meters(&meters, &vendors))
}
