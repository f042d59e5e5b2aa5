//! Tenant-scoped ERP relay for the platform API.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | Greeting |
//! | `POST /test` | Echo the JSON body |
//! | `POST /connect-tenant` | Verify a session token and record its tenant |
//! | `ANY /erp-info/{tenant_id}/{endpoint}` | Forward a call to the ERP API |
//!
//! Every platform call is authorized with a fresh service credential from
//! the client-credentials exchange.

pub mod app;
pub mod config;
pub mod erp;
pub mod error;
pub mod routes;
pub mod tenant_store;

pub use app::{AppState, build_app};
pub use config::RelayConfig;
pub use error::RelayError;
