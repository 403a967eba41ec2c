//! cloudsweep Core
//!
//! Core types, traits, and error handling for the cloudsweep account auditor.

pub mod config;
pub mod credentials;
pub mod error;
pub mod report;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::*;
pub use credentials::{load_accounts, parse_accounts, Account};
pub use error::{ApiError, CloudsweepError, Result};
pub use report::*;
pub use traits::*;
