//! # Models
//!
//! Shapes shared by the server and the client. Everything here is the JSON
//! wire format: camelCase field names, `SCREAMING_SNAKE_CASE` enum values.
//!
//! - [`entities`]: stored documents as the API exposes them
//! - [`payloads`]: request bodies and the response envelopes
//! - [`status`]: roles and the meter/installation status sets

pub mod entities;
pub mod payloads;
pub mod status;

pub use entities::{GpsLocation, Installation, Meter, MeterStats, User, Vendor, VendorStock};
pub use status::{InstallationStatus, MeterStatus, Role};

use thiserror::Error;

/// A request field failed validation. The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
