//! Core traits that define the cloud provider abstraction layer.
//!
//! The scan engine only talks to providers through these traits, so a scripted
//! session can stand in for the real SDK in tests.

use crate::credentials::Account;
use crate::error::Result;
use crate::report::AccountOutcome;
use std::sync::Arc;

/// A named filter applied server-side to a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFilter {
    pub name: String,
    pub values: Vec<String>,
}

/// Optional parameters for a service operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallParams {
    /// Server-side filters (`Filters=[{Name, Values}]`)
    pub filters: Vec<CallFilter>,
    /// Owner restriction (`self` for account-owned resources)
    pub owners: Vec<String>,
    /// Service-specific scope, e.g. `CLOUDFRONT` or `REGIONAL`
    pub scope: Option<String>,
    /// Identifier of a single resource to describe
    pub resource_id: Option<String>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server-side filter
    pub fn filter<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(CallFilter {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Restrict to resources owned by `owner`
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    /// Set the service-specific scope
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Target a single resource
    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Values of the named filter, if present
    pub fn filter_values(&self, name: &str) -> Option<&[String]> {
        self.filters
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.values.as_slice())
    }
}

/// A client for one service, scoped to one region
pub trait ServiceClient: Send + Sync {
    /// Invoke a named operation and return the response document.
    ///
    /// Provider failures are reported as [`crate::CloudsweepError::Api`];
    /// anything else is an unexpected error.
    fn invoke(&self, operation: &str, params: &CallParams) -> Result<serde_json::Value>;
}

/// An authenticated session for one account
pub trait CloudSession: Send + Sync {
    /// Build a client for `service` in `region`
    fn client(&self, service: &str, region: &str) -> Result<Box<dyn ServiceClient>>;
}

/// Opens sessions from account credentials
pub trait SessionProvider: Send + Sync {
    /// Provider name (e.g., "aws")
    fn name(&self) -> &str;

    /// Authenticate and return a session for `account`
    fn open(&self, account: &Account) -> Result<Arc<dyn CloudSession>>;
}

/// Progress reporting abstraction for UI/CLI
pub trait ProgressReporter: Send + Sync {
    /// Called before an account scan begins
    fn account_started(&self, account: &Account);

    /// Called once the task list for an account is known
    fn tasks_planned(&self, account: &Account, total: usize);

    /// Called when an unexpected task error is surfaced
    fn diagnostic(&self, account: &Account, message: &str);

    /// Called when an account's outcome is final
    fn account_finished(&self, outcome: &AccountOutcome);
}

/// No-op progress reporter for silent operation
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn account_started(&self, _account: &Account) {}
    fn tasks_planned(&self, _account: &Account, _total: usize) {}
    fn diagnostic(&self, _account: &Account, _message: &str) {}
    fn account_finished(&self, _outcome: &AccountOutcome) {}
}

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_params_builder() {
        let params = CallParams::new()
            .filter("instance-state-name", ["pending", "running"])
            .owner("self")
            .scope("REGIONAL");

        assert_eq!(
            params.filter_values("instance-state-name"),
            Some(&["pending".to_string(), "running".to_string()][..])
        );
        assert_eq!(params.filter_values("is-default"), None);
        assert_eq!(params.owners, vec!["self".to_string()]);
        assert_eq!(params.scope.as_deref(), Some("REGIONAL"));
        assert!(params.resource_id.is_none());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
