//! Resource checks for cloudsweep
//!
//! Holds the curated table of resource checks and the per-resource filters
//! that decide when a listing is worth reporting.
//!
//! # Example
//!
//! ```no_run
//! use cloudsweep_checks::{CheckRegistry, FilterTable};
//! use cloudsweep_core::Scope;
//!
//! let registry = CheckRegistry::builtin();
//! let filters = FilterTable::builtin();
//!
//! for check in registry.checks() {
//!     let special = if filters.has_rule(&check.name) { "*" } else { "" };
//!     println!("{}{} [{}]", check.name, special, check.scope);
//! }
//! println!("{} global checks", registry.filter_by_scope(Scope::Global).len());
//! ```

pub mod filters;
pub mod registry;

pub use filters::{
    list_at, object_at, AccountUsers, CountAll, DisabledCustomerKeys, EnabledDistributions, FilterInput,
    FilterTable, LiveInstances, NonDefaultNetworks, ResourceFilter, ScopedListing, SelfOwned,
    LIVE_INSTANCE_STATES,
};
pub use registry::{CheckRegistry, ResourceCheckSpec};
