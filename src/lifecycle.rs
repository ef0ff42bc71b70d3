//! # Meter Lifecycle
//!
//! ```text
//! AVAILABLE ──install (IN_TRANSIT)──▶ ASSIGNED_TO_INSTALLER ──INSTALLED──▶ INSTALLED
//!     └──────────────install (INSTALLED)───────────────────────────────────────▲
//! ```
//!
//! `DAMAGED` is never set by the API.
//!
//! ## Installation Status
//! - `IN_TRANSIT` on creation unless the request says otherwise
//! - `PUT /installations/{id}` may move it either way, the meter follows
//! - Nothing stops `INSTALLED` going back to `IN_TRANSIT`
//!
//! ## Meter Link
//! An installation names its meter by serial number. If no meter has that
//! serial the installation is still saved and the response says
//! `meterSynced: false`.
//!
//! ## Dashboards
//!
//! ### Admin
//! - Stock: total, assigned (handed out or installed), installed, in transit, balance
//! - Distribution: per vendor counts, vendors without meters included
//! - Tracking: installations with their meter's current status
//!
//! ### Installer
//! - Today's installations, in transit, total, matched on installer name
//! - Daily form: vendor first, then one of that vendor's available meters
//! - GPS must be captured before the form submits
//!
//! ### Vendor
//! - Own meters only, plus installations made with them
