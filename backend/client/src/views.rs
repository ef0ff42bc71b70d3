//! Dashboard figures derived from store snapshots. Nothing here talks to the
//! server; every view is recomputed from the current meters, vendors and
//! installations.
use chrono::{DateTime, Local, NaiveDate, Utc};
use models::{
    Installation, InstallationStatus, Meter, MeterStats, MeterStatus, Vendor, VendorStock,
    payloads::{GpsInput, InstallationInput},
};
use serde::Serialize;

/// Headline stock numbers.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub total_meters: usize,
    /// Handed to an installer or already in the ground.
    pub assigned_meters: usize,
    pub installed_meters: usize,
    /// Installations still on their way to the site.
    pub in_transit_meters: usize,
    /// Meters nobody has used yet.
    pub balance_count: usize,
}

impl Stock {
    pub fn compute(meters: &[Meter], installations: &[Installation]) -> Self {
        let count = |status: MeterStatus| meters.iter().filter(|m| m.status == status).count();
        let installed = count(MeterStatus::Installed);

        Self {
            total_meters: meters.len(),
            assigned_meters: count(MeterStatus::AssignedToInstaller) + installed,
            installed_meters: installed,
            in_transit_meters: installations
                .iter()
                .filter(|i| i.status == InstallationStatus::InTransit)
                .count(),
            balance_count: count(MeterStatus::Available),
        }
    }
}

/// Per-vendor counts, including vendors that have no meters yet.
pub fn distribution(meters: &[Meter], vendors: &[Vendor]) -> Vec<VendorStock> {
    let mut lines = MeterStats::from_meters(meters, vendors).vendors;

    for vendor in vendors {
        match lines.iter_mut().find(|line| line.vendor_id == vendor.id) {
            Some(line) => line.vendor_name = vendor.name.clone(),
            None => lines.push(VendorStock {
                vendor_id: vendor.id.clone(),
                vendor_name: vendor.name.clone(),
                ..VendorStock::default()
            }),
        }
    }

    lines.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));
    lines
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRow<'a> {
    pub installation: &'a Installation,
    /// `None` when no meter carries the installation's serial number.
    pub meter_status: Option<MeterStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackingFilter {
    pub status: Option<InstallationStatus>,
    pub installer_name: Option<String>,
}

pub fn tracking<'a>(
    installations: &'a [Installation],
    meters: &[Meter],
    filter: &TrackingFilter,
) -> Vec<TrackingRow<'a>> {
    installations
        .iter()
        .filter(|i| filter.status.is_none_or(|status| i.status == status))
        .filter(|i| {
            filter
                .installer_name
                .as_ref()
                .is_none_or(|name| &i.installer_name == name)
        })
        .map(|installation| TrackingRow {
            installation,
            meter_status: meters
                .iter()
                .find(|m| m.serial_number == installation.meter_serial_number)
                .map(|m| m.status),
        })
        .collect()
}

/// Distinct installer names in first seen order, for the tracking filter.
pub fn installer_names(installations: &[Installation]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for installation in installations {
        if !names.contains(&installation.installer_name.as_str()) {
            names.push(&installation.installer_name);
        }
    }
    names
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorView<'a> {
    pub vendor: Option<&'a Vendor>,
    pub meters: Vec<&'a Meter>,
    pub installations: Vec<&'a Installation>,
    pub total_meters: usize,
    pub in_stock: usize,
    pub in_transit: usize,
    pub installed: usize,
}

/// A vendor's own meters and the installations made with them.
pub fn vendor_view<'a>(
    vendor_id: &str,
    vendors: &'a [Vendor],
    meters: &'a [Meter],
    installations: &'a [Installation],
) -> VendorView<'a> {
    let own: Vec<&Meter> = meters
        .iter()
        .filter(|m| m.vendor_id.as_deref() == Some(vendor_id))
        .collect();

    let installs: Vec<&Installation> = installations
        .iter()
        .filter(|i| own.iter().any(|m| m.serial_number == i.meter_serial_number))
        .collect();

    let with_status =
        |status: InstallationStatus| installs.iter().filter(|i| i.status == status).count();

    VendorView {
        vendor: vendors.iter().find(|v| v.id == vendor_id),
        total_meters: own.len(),
        in_stock: own
            .iter()
            .filter(|m| m.status == MeterStatus::Available)
            .count(),
        in_transit: with_status(InstallationStatus::InTransit),
        installed: with_status(InstallationStatus::Installed),
        meters: own,
        installations: installs,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallerView<'a> {
    pub today: Vec<&'a Installation>,
    pub in_transit: Vec<&'a Installation>,
    pub total: usize,
}

/// Installations logged under `installer_name`. "Today" is judged in local
/// time, so pass `Local::now().date_naive()` outside of tests.
pub fn installer_view<'a>(
    installer_name: &str,
    installations: &'a [Installation],
    today: NaiveDate,
) -> InstallerView<'a> {
    let mine: Vec<&Installation> = installations
        .iter()
        .filter(|i| i.installer_name == installer_name)
        .collect();

    InstallerView {
        today: mine
            .iter()
            .copied()
            .filter(|i| local_date(i.installation_date) == today)
            .collect(),
        in_transit: mine
            .iter()
            .copied()
            .filter(|i| i.status == InstallationStatus::InTransit)
            .collect(),
        total: mine.len(),
    }
}

fn local_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&Local).date_naive()
}

/// Serials an installer may pick: the chosen vendor's meters still available.
pub fn selectable_meters<'a>(
    vendor_name: &str,
    vendors: &[Vendor],
    meters: &'a [Meter],
) -> Vec<&'a Meter> {
    let Some(vendor) = vendors.iter().find(|v| v.name == vendor_name) else {
        return Vec::new();
    };

    meters
        .iter()
        .filter(|m| m.vendor_id.as_deref() == Some(vendor.id.as_str()))
        .filter(|m| m.status == MeterStatus::Available)
        .collect()
}

/// Daily installation form as typed in. GPS comes from the device, not the
/// user, so it stays empty until captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallationForm {
    pub installer_name: String,
    pub vendor_name: String,
    pub meter_serial_number: String,
    pub consumer_name: String,
    pub consumer_address: String,
    pub old_meter_reading: String,
    pub new_meter_reading: String,
    pub gps: Option<(f64, f64)>,
    pub status: InstallationStatus,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
}

pub const FORM_INCOMPLETE: &str = "Please fill all required fields and capture GPS location";

impl InstallationForm {
    /// Blank form with the installer name prefilled for installer accounts.
    pub fn for_installer(installer_name: &str) -> Self {
        Self {
            installer_name: installer_name.to_string(),
            ..Self::default()
        }
    }

    /// Builds the request body, stamped with `now` as the installation date.
    /// The server repeats the full field check.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<InstallationInput, String> {
        let filled = |value: &str| !value.trim().is_empty();

        let Some((latitude, longitude)) = self.gps else {
            return Err(FORM_INCOMPLETE.to_string());
        };

        if !filled(&self.installer_name)
            || !filled(&self.meter_serial_number)
            || !filled(&self.consumer_name)
        {
            return Err(FORM_INCOMPLETE.to_string());
        }

        let text = |value: &str| filled(value).then(|| value.trim().to_string());

        Ok(InstallationInput {
            meter_serial_number: text(&self.meter_serial_number),
            installer_name: text(&self.installer_name),
            vendor_name: text(&self.vendor_name),
            consumer_name: text(&self.consumer_name),
            consumer_address: text(&self.consumer_address),
            gps_location: Some(GpsInput {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }),
            installation_date: Some(now),
            old_meter_reading: text(&self.old_meter_reading),
            new_meter_reading: text(&self.new_meter_reading),
            photos_before: self.photos_before.clone(),
            photos_after: self.photos_after.clone(),
            status: Some(self.status),
        })
    }
}
