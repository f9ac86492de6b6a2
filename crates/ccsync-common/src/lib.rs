//! ccsync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared vocabulary, utilities, and error handling for the ccsync workspace.
//!
//! # Overview
//!
//! - **Types**: entity kinds and the staged object naming convention
//! - **Checksums**: payload digests recorded for every staged object
//! - **Logging**: structured logging setup shared by both triggers
//!
//! # Example
//!
//! ```no_run
//! use ccsync_common::types::{EntityKind, ObjectName};
//! use chrono::NaiveDate;
//!
//! # fn main() -> ccsync_common::Result<()> {
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let name = ObjectName::new(date, EntityKind::User, 0);
//! assert_eq!(name.to_string(), "2024-03-01_users_0.json");
//! assert_eq!(ObjectName::parse("2024-03-01_users_0.json")?, name);
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{EntityKind, ObjectName};
