//! Request bodies and response envelopes.
//!
//! Request fields are optional on the wire so a missing field turns into a
//! readable message instead of a deserializer error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    GpsLocation, Installation, InstallationStatus, Meter, Role, User, ValidationError,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_ASSIGN_QUANTITY: i64 = 1000;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MeResponse {
    pub success: bool,
    pub user: User,
}

/// Body of `POST /api/users` and `PUT /api/users/:id`. On update every field
/// is optional; `email` is only used for the credentials notification.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Checked user fields ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub vendor_id: Option<String>,
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn collect(errors: Vec<&str>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors.join(". ")))
    }
}

impl UserInput {
    pub fn email(&self) -> Option<String> {
        present(&self.email)
    }

    /// Validation for a new account. Vendor existence is checked by the server.
    pub fn validate_new(&self) -> Result<UserDraft, ValidationError> {
        let username = present(&self.username).map(|u| normalize_username(&u));
        let password = self.password.clone().filter(|p| !p.is_empty());
        let name = present(&self.name);

        let mut errors = Vec::new();
        if username.is_none() {
            errors.push("Username is required");
        }
        if password.is_none() {
            errors.push("Password is required");
        }
        if name.is_none() {
            errors.push("Name is required");
        }
        if self.role.is_none() {
            errors.push("Role is required");
        }
        collect(errors)?;

        let (Some(username), Some(password), Some(name), Some(role)) =
            (username, password, name, self.role)
        else {
            return Err(ValidationError::new("Invalid user"));
        };

        check_password(&password)?;

        let vendor_id = vendor_for_role(role, present(&self.vendor_id))?;

        Ok(UserDraft {
            username,
            password,
            name,
            role,
            vendor_id,
        })
    }

    /// Validation of the fields present in an update.
    pub fn validate_update(&self) -> Result<(), ValidationError> {
        if self.username.is_some() && present(&self.username).is_none() {
            return Err(ValidationError::new("Username is required"));
        }
        if self.name.is_some() && present(&self.name).is_none() {
            return Err(ValidationError::new("Name is required"));
        }
        if let Some(password) = &self.password {
            check_password(password)?;
        }

        Ok(())
    }

    pub fn username(&self) -> Option<String> {
        present(&self.username).map(|u| normalize_username(&u))
    }

    pub fn name(&self) -> Option<String> {
        present(&self.name)
    }

    pub fn vendor_id(&self) -> Option<String> {
        present(&self.vendor_id)
    }
}

/// Only vendor accounts carry a vendor link.
pub fn vendor_for_role(
    role: Role,
    vendor_id: Option<String>,
) -> Result<Option<String>, ValidationError> {
    match (role, vendor_id) {
        (Role::Vendor, Some(vendor_id)) => Ok(Some(vendor_id)),
        (Role::Vendor, None) => Err(ValidationError::new(
            "Vendor ID is required for vendor accounts",
        )),
        (_, _) => Ok(None),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub success: bool,
    pub data: User,
    pub email_sent: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl VendorInput {
    pub fn name(&self) -> Option<String> {
        present(&self.name)
    }

    pub fn validate_new(&self) -> Result<String, ValidationError> {
        self.name()
            .ok_or_else(|| ValidationError::new("Vendor name is required"))
    }

    pub fn validate_update(&self) -> Result<(), ValidationError> {
        if self.name.is_some() && self.name().is_none() {
            return Err(ValidationError::new("Vendor name is required"));
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl AssignRequest {
    pub fn validate(&self) -> Result<(String, u64), ValidationError> {
        let vendor_id =
            present(&self.vendor_id).ok_or_else(|| ValidationError::new("Vendor ID is required"))?;

        let quantity = self
            .quantity
            .ok_or_else(|| ValidationError::new("Quantity is required"))?;

        if quantity < 1 {
            return Err(ValidationError::new("Quantity must be at least 1"));
        }
        if quantity > MAX_ASSIGN_QUANTITY {
            return Err(ValidationError(format!(
                "Quantity cannot exceed {MAX_ASSIGN_QUANTITY}"
            )));
        }

        Ok((vendor_id, quantity as u64))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assigned_count: u64,
    pub meters: Vec<Meter>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct GpsInput {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl From<GpsLocation> for GpsInput {
    fn from(location: GpsLocation) -> Self {
        Self {
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
        }
    }
}

/// Body of `POST /api/installations`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_meter_reading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_meter_reading: Option<String>,
    #[serde(default)]
    pub photos_before: Vec<String>,
    #[serde(default)]
    pub photos_after: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstallationStatus>,
}

/// Checked installation fields; the server adds id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationDraft {
    pub meter_serial_number: String,
    pub installer_name: String,
    pub vendor_name: String,
    pub consumer_name: String,
    pub consumer_address: String,
    pub gps_location: GpsLocation,
    pub installation_date: Option<DateTime<Utc>>,
    pub old_meter_reading: String,
    pub new_meter_reading: String,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
    pub status: InstallationStatus,
}

impl InstallationInput {
    pub fn validate(&self) -> Result<InstallationDraft, ValidationError> {
        let serial = present(&self.meter_serial_number);
        let installer = present(&self.installer_name);
        let vendor = present(&self.vendor_name);
        let consumer = present(&self.consumer_name);
        let address = present(&self.consumer_address);
        let reading = present(&self.new_meter_reading);
        let gps = self.gps_location.unwrap_or_default();

        let mut errors = Vec::new();
        if serial.is_none() {
            errors.push("Meter serial number is required");
        }
        if installer.is_none() {
            errors.push("Installer name is required");
        }
        if vendor.is_none() {
            errors.push("Vendor name is required");
        }
        if consumer.is_none() {
            errors.push("Consumer name is required");
        }
        if address.is_none() {
            errors.push("Consumer address is required");
        }
        if gps.latitude.is_none() {
            errors.push("Latitude is required");
        }
        if gps.longitude.is_none() {
            errors.push("Longitude is required");
        }
        if reading.is_none() {
            errors.push("New meter reading is required");
        }
        collect(errors)?;

        let (
            Some(meter_serial_number),
            Some(installer_name),
            Some(vendor_name),
            Some(consumer_name),
            Some(consumer_address),
            Some(new_meter_reading),
            Some(latitude),
            Some(longitude),
        ) = (
            serial,
            installer,
            vendor,
            consumer,
            address,
            reading,
            gps.latitude,
            gps.longitude,
        )
        else {
            return Err(ValidationError::new("Invalid installation"));
        };

        let gps_location = GpsLocation {
            latitude,
            longitude,
        };
        gps_location.validate()?;

        Ok(InstallationDraft {
            meter_serial_number,
            installer_name,
            vendor_name,
            consumer_name,
            consumer_address,
            gps_location,
            installation_date: self.installation_date,
            old_meter_reading: present(&self.old_meter_reading).unwrap_or_default(),
            new_meter_reading,
            photos_before: self.photos_before.clone(),
            photos_after: self.photos_after.clone(),
            status: self.status.unwrap_or_default(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<InstallationStatus>,
}

/// Installation write result. `meter_synced` is false when no meter carries
/// the serial number; the installation is stored either way.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InstallationResponse {
    pub success: bool,
    pub data: Installation,
    pub meter_synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub updated: u64,
    pub failed: u64,
    pub total: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: SyncStats,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadResponse {
    pub success: bool,
    pub data: Vec<String>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installation() -> InstallationInput {
        InstallationInput {
            meter_serial_number: Some("MTR-00001".to_string()),
            installer_name: Some("Rajesh Kumar".to_string()),
            vendor_name: Some("PowerGrid Corp".to_string()),
            consumer_name: Some("Sunita Devi".to_string()),
            consumer_address: Some("12 MG Road".to_string()),
            gps_location: Some(GpsInput {
                latitude: Some(28.6139),
                longitude: Some(77.209),
            }),
            new_meter_reading: Some("0000".to_string()),
            ..InstallationInput::default()
        }
    }

    #[test]
    fn test_installation_defaults() {
        let draft = installation().validate().unwrap();

        assert_eq!(draft.status, InstallationStatus::InTransit);
        assert_eq!(draft.old_meter_reading, "");
        assert!(draft.photos_before.is_empty());
        assert!(draft.installation_date.is_none());
    }

    #[test]
    fn test_installation_missing_fields() {
        let mut input = installation();
        input.consumer_name = Some("   ".to_string());
        input.gps_location = None;

        let err = input.validate().unwrap_err();
        assert_eq!(
            err.0,
            "Consumer name is required. Latitude is required. Longitude is required"
        );
    }

    #[test]
    fn test_installation_gps_out_of_range() {
        let mut input = installation();
        input.gps_location = Some(GpsInput {
            latitude: Some(120.0),
            longitude: Some(0.0),
        });

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_user_normalized() {
        let input = UserInput {
            username: Some("  Rajesh ".to_string()),
            password: Some("secret1".to_string()),
            name: Some("Rajesh Kumar".to_string()),
            role: Some(Role::Installer),
            vendor_id: Some("v1".to_string()),
            email: None,
        };

        let draft = input.validate_new().unwrap();
        assert_eq!(draft.username, "rajesh");
        assert_eq!(draft.vendor_id, None);
    }

    #[test]
    fn test_user_short_password() {
        let input = UserInput {
            username: Some("amit".to_string()),
            password: Some("abc".to_string()),
            name: Some("Amit Patel".to_string()),
            role: Some(Role::Installer),
            ..UserInput::default()
        };

        assert_eq!(
            input.validate_new().unwrap_err().0,
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_vendor_account_needs_vendor() {
        let input = UserInput {
            username: Some("vendor1".to_string()),
            password: Some("password".to_string()),
            name: Some("PowerGrid Corp User".to_string()),
            role: Some(Role::Vendor),
            ..UserInput::default()
        };

        assert!(input.validate_new().is_err());
    }

    #[test]
    fn test_assign_quantity() {
        let request = AssignRequest {
            vendor_id: Some("v1".to_string()),
            quantity: Some(0),
        };
        assert!(request.validate().is_err());

        let request = AssignRequest {
            vendor_id: Some("v1".to_string()),
            quantity: Some(5),
        };
        assert_eq!(request.validate().unwrap(), ("v1".to_string(), 5));

        let request = AssignRequest {
            vendor_id: None,
            quantity: Some(5),
        };
        assert_eq!(request.validate().unwrap_err().0, "Vendor ID is required");
    }
}
