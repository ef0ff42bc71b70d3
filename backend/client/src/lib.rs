//! # Client
//!
//! Everything the dashboards need short of markup:
//!
//! - [`ApiClient`]: one typed call per REST endpoint, errors carry the server message
//! - [`ClientStore`]: session snapshot plus the actions that change it
//! - [`views`]: stock, distribution, tracking, vendor and installer views
//!
//! ```no_run
//! use client::{ApiClient, ClientStore};
//!
//! # async fn run() -> Result<(), client::ClientError> {
//! let mut store = ClientStore::new(ApiClient::new("http://localhost:5000"));
//! store.login("admin", "admin123").await?;
//! store.refresh().await?;
//! println!("{} meters in balance", store.stock().balance_count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod store;
pub mod views;

pub use api::{ApiClient, ClientError, Photo};
pub use store::ClientStore;
