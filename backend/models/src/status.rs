use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Installer,
    Vendor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Installer => "INSTALLER",
            Role::Vendor => "VENDOR",
        }
    }

    /// Human title used in notification emails.
    pub fn title(self) -> &'static str {
        match self {
            Role::Admin => "User",
            Role::Installer => "Installer",
            Role::Vendor => "Vendor",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeterStatus {
    #[default]
    Available,
    AssignedToInstaller,
    Installed,
    Damaged,
}

impl MeterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeterStatus::Available => "AVAILABLE",
            MeterStatus::AssignedToInstaller => "ASSIGNED_TO_INSTALLER",
            MeterStatus::Installed => "INSTALLED",
            MeterStatus::Damaged => "DAMAGED",
        }
    }
}

impl Display for MeterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeterStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(MeterStatus::Available),
            "ASSIGNED_TO_INSTALLER" => Ok(MeterStatus::AssignedToInstaller),
            "INSTALLED" => Ok(MeterStatus::Installed),
            "DAMAGED" => Ok(MeterStatus::Damaged),
            other => Err(ValidationError(format!("Invalid meter status: {other}"))),
        }
    }
}

/// IN_TRANSIT is the initial state, INSTALLED is terminal. Nothing stops a
/// caller from re-sending either one; the meter mapping is simply re-applied.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallationStatus {
    #[default]
    InTransit,
    Installed,
}

impl InstallationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallationStatus::InTransit => "IN_TRANSIT",
            InstallationStatus::Installed => "INSTALLED",
        }
    }

    /// Status the referenced meter takes whenever an installation is written.
    pub fn meter_status(self) -> MeterStatus {
        match self {
            InstallationStatus::InTransit => MeterStatus::AssignedToInstaller,
            InstallationStatus::Installed => MeterStatus::Installed,
        }
    }
}

impl Display for InstallationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_TRANSIT" => Ok(InstallationStatus::InTransit),
            "INSTALLED" => Ok(InstallationStatus::Installed),
            other => Err(ValidationError(format!(
                "Invalid installation status: {other}"
            ))),
        }
    }
}
