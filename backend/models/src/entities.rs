use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{InstallationStatus, MeterStatus, Role, ValidationError};

/// Account as returned by the API. The password hash never leaves the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    /// Bumped on every bulk assignment, never recounted.
    #[serde(default)]
    pub assigned_meters_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    pub id: String,
    pub serial_number: String,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    pub status: MeterStatus,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub assigned_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub installer_id: Option<String>,
    #[serde(default)]
    pub installation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsLocation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::new(
                "Latitude must be between -90 and 90",
            ));
        }

        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::new(
                "Longitude must be between -180 and 180",
            ));
        }

        Ok(())
    }
}

/// Field record of a meter placed at a consumer site. Points at its meter by
/// serial number and copies installer/vendor names instead of linking them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub id: String,
    pub meter_serial_number: String,
    pub installer_name: String,
    pub vendor_name: String,
    pub consumer_name: String,
    pub consumer_address: String,
    pub gps_location: GpsLocation,
    pub installation_date: DateTime<Utc>,
    #[serde(default)]
    pub old_meter_reading: String,
    pub new_meter_reading: String,
    #[serde(default)]
    pub photos_before: Vec<String>,
    #[serde(default)]
    pub photos_after: Vec<String>,
    pub status: InstallationStatus,
    pub created_at: DateTime<Utc>,
}

/// Per-vendor stock line of [`MeterStats`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorStock {
    pub vendor_id: String,
    pub vendor_name: String,
    pub total: u64,
    pub available: u64,
    pub assigned: u64,
    pub installed: u64,
    pub damaged: u64,
}

impl VendorStock {
    pub fn count(&mut self, status: MeterStatus) {
        self.total += 1;
        match status {
            MeterStatus::Available => self.available += 1,
            MeterStatus::AssignedToInstaller => self.assigned += 1,
            MeterStatus::Installed => self.installed += 1,
            MeterStatus::Damaged => self.damaged += 1,
        }
    }
}

/// Stock counts derived from the meter collection on every read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeterStats {
    pub total_meters: u64,
    pub available_meters: u64,
    pub assigned_meters: u64,
    pub installed_meters: u64,
    pub damaged_meters: u64,
    pub balance_count: u64,
    pub vendors: Vec<VendorStock>,
}

impl MeterStats {
    /// Vendor lines take the vendor's current name; the copy on the meter is
    /// only used once the vendor itself is gone.
    pub fn from_meters<'a>(
        meters: impl IntoIterator<Item = &'a Meter>,
        known: &[Vendor],
    ) -> Self {
        let mut stats = MeterStats::default();
        let mut vendors: Vec<VendorStock> = Vec::new();

        for meter in meters {
            stats.total_meters += 1;
            match meter.status {
                MeterStatus::Available => stats.available_meters += 1,
                MeterStatus::AssignedToInstaller => stats.assigned_meters += 1,
                MeterStatus::Installed => stats.installed_meters += 1,
                MeterStatus::Damaged => stats.damaged_meters += 1,
            }

            let Some(vendor_id) = &meter.vendor_id else {
                continue;
            };

            let position = match vendors.iter().position(|v| &v.vendor_id == vendor_id) {
                Some(position) => position,
                None => {
                    let vendor_name = known
                        .iter()
                        .find(|vendor| &vendor.id == vendor_id)
                        .map(|vendor| vendor.name.clone())
                        .or_else(|| meter.vendor_name.clone())
                        .unwrap_or_default();
                    vendors.push(VendorStock {
                        vendor_id: vendor_id.clone(),
                        vendor_name,
                        ..VendorStock::default()
                    });
                    vendors.len() - 1
                }
            };

            vendors[position].count(meter.status);
        }

        stats.balance_count = stats.available_meters;
        vendors.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));
        stats.vendors = vendors;

        stats
    }
}
