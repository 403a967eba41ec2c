//! Orchestration engine for cloudsweep account audits
//!
//! Discovers an account's enabled regions, fans the check registry out over a
//! bounded worker pool and folds the outcomes into a sorted report. Accounts
//! are scanned strictly one after another.

mod aggregator;
mod dispatcher;
mod output;
mod regions;
mod runner;

pub use aggregator::*;
pub use dispatcher::*;
pub use output::*;
pub use regions::*;
pub use runner::*;
