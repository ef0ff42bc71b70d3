//! # Meters Documentation
//!
//! Utility meter inventory and field installation tracking.
//!
//! Admins hand batches of meters to vendor companies, installers log each
//! meter they fit at a consumer site with GPS and photos, and every role gets
//! its own dashboard.
//!
//! ## Layout
//! - `backend/models`: JSON shapes shared by server and client
//! - `backend/server`: axum REST API, document store, auth, mail, photo hosting
//! - `backend/client`: typed API client, client store and dashboard views
//! - `backend`: the `meters` binary
//!
//! ## Running
//!
//! In memory, nothing persists across restarts.
//! ```sh
//! JWT_SECRET=dev ADMIN_USERNAME=admin ADMIN_PASSWORD=admin123 RUST_LOG=info cargo run --bin meters
//! ```
//!
//! With Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 JWT_SECRET=dev RUST_LOG=info cargo run --bin meters
//! ```
//!
//! Docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! ## Notes
//!
//! ### Two step writes
//! Meter inserts and the vendor counter, and an installation and its meter,
//! are written one after the other. A crash in between leaves the second
//! record stale. `POST /api/installations/sync-meter-statuses` repairs meter
//! statuses; the vendor counter is never recounted.
//!
//! ### Serial numbers
//! `MTR-00001` onwards, picked from the highest existing suffix when an
//! assignment starts. Two admins assigning at the same moment race for the
//! same numbers; the serial index lets only one insert of each win.

pub mod api;
pub mod lifecycle;
