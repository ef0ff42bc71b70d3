//! # REST API
//!
//! Everything lives under `/api`. JSON in and out, camelCase fields.
//!
//! ## Auth
//! - `Authorization: Bearer <jwt>` on every route except login and health
//! - Tokens last `JWT_EXPIRE_DAYS` (30), there is no refresh
//! - Logout is the client dropping its token
//!
//! ## Endpoints
//!
//! | Method | Path | Roles |
//! |---|---|---|
//! | POST | `/auth/login` | public |
//! | GET | `/auth/me` | any |
//! | GET, POST | `/users` | ADMIN |
//! | GET, PUT, DELETE | `/users/{id}` | ADMIN |
//! | GET | `/vendors`, `/vendors/{id}` | any |
//! | POST, PUT, DELETE | `/vendors`, `/vendors/{id}` | ADMIN |
//! | GET | `/meters?status=&vendorId=` | any |
//! | GET | `/meters/stats` | ADMIN |
//! | POST | `/meters/assign` | ADMIN |
//! | GET | `/meters/vendor/{vendorId}` | any, vendors only their own |
//! | GET | `/installations?status=&installerName=&vendorName=&meterSerialNumber=` | any |
//! | GET | `/installations/{id}` | any |
//! | POST | `/installations` | any |
//! | PUT | `/installations/{id}` | any |
//! | POST | `/installations/sync-meter-statuses` | ADMIN |
//! | POST | `/upload` | any |
//! | GET | `/health` | public |
//!
//! ## Envelopes
//! - List: `{ success, count, data: [...] }`
//! - Single: `{ success, data }`
//! - User writes add `emailSent`
//! - Installation writes add `meterSynced` and sometimes `message`
//! - Errors: `{ success: false, error }`
//!
//! ## Status Codes
//! - 400: missing or bad field, malformed JSON, duplicate username/vendor name
//! - 401: no token, bad or expired token, deleted account, wrong login
//! - 403: role not allowed
//! - 404: unknown id
//! - 500: `Server error`, or `Something went wrong!` after a handler panic
//! - 503: photo upload without Cloudinary credentials
//!
//! ## Upload
//! Multipart field `photos`, one to ten images, 5MB each. Returns the hosted
//! URLs in order; attaching them to an installation is up to the client.
