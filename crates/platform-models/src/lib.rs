#![deny(missing_docs)]

//! # Platform Models
//!
//! Core data types shared by the ERP relay, the platform SDK and the mock
//! platform.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`tenant`] | Tenant and user identifiers (`TenantId`, `LocalTenantId`, `UserId`) |
//! | [`session`] | Claims carried by a platform session token |
//! | [`error`] | Validation errors for model constructors |

pub mod error;
pub mod session;
pub mod tenant;

// Re-export all public types at crate root for convenience.
pub use error::*;
pub use session::*;
pub use tenant::*;
