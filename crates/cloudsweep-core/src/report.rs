//! Report types for findings and per-account scan results

use serde::{Deserialize, Serialize};

/// Region identifier as reported by the provider (e.g. `eu-north-1`)
pub type Region = String;

/// Whether a check runs once per account or once per enabled region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Checked once, from the anchor region
    Global,
    /// Checked once in every enabled region
    Regional,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Regional => write!(f, "regional"),
        }
    }
}

/// A reportable observation: a resource type with a non-zero count somewhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Check name that produced the finding
    pub resource_name: String,

    /// Region the listing was issued in
    pub region: Region,

    /// Scope of the originating check
    pub scope: Scope,

    /// Number of flagged resources
    pub count: usize,

    /// Extra human-readable context, shown instead of the region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    /// Create a new finding
    pub fn new(
        resource_name: impl Into<String>,
        region: impl Into<Region>,
        scope: Scope,
        count: usize,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            region: region.into(),
            scope,
            count,
            detail: None,
        }
    }

    /// Attach detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// One-line summary: `<resource type> found: <count> (<region or detail>)`
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} found: {}", self.resource_name, self.count)?;
        match (&self.detail, self.scope) {
            (Some(detail), _) => write!(f, " ({})", detail),
            (None, Scope::Regional) => write!(f, " ({})", self.region),
            (None, Scope::Global) => Ok(()),
        }
    }
}

/// Counters describing how the tasks of one account scan ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Tasks dispatched
    pub total: usize,
    /// Tasks that produced a finding
    pub with_findings: usize,
    /// Tasks that completed with nothing to report
    pub clean: usize,
    /// Tasks whose provider error was absorbed
    pub absorbed: usize,
    /// Tasks that failed unexpectedly
    pub failed: usize,
}

/// Final, deterministic result of scanning one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Display name of the account
    pub account: String,

    /// Abbreviated access key, safe to print
    pub key_hint: String,

    /// Regions the scan covered, sorted
    pub regions: Vec<Region>,

    /// Deduplicated finding summaries in lexicographic order
    pub lines: Vec<String>,

    /// Findings backing `lines`, in the same order. When several tasks
    /// produce the same line, the finding from the lowest region is kept.
    pub findings: Vec<Finding>,

    /// Unexpected task errors, sorted
    #[serde(default)]
    pub diagnostics: Vec<String>,

    /// Task statistics
    pub stats: TaskStats,

    /// When the scan started
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// When the scan completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl ScanReport {
    /// True when no finding was produced
    pub fn is_clean(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What happened to one account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountOutcome {
    /// The scan ran to completion
    Completed(ScanReport),
    /// The scan was abandoned before any task was dispatched
    Aborted {
        account: String,
        key_hint: String,
        reason: String,
    },
}

impl AccountOutcome {
    /// Display name of the account
    pub fn account(&self) -> &str {
        match self {
            AccountOutcome::Completed(report) => &report.account,
            AccountOutcome::Aborted { account, .. } => account,
        }
    }

    /// Whether the account produced at least one finding
    pub fn has_findings(&self) -> bool {
        matches!(self, AccountOutcome::Completed(report) if !report.is_clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_summary_shows_region() {
        let finding = Finding::new("Compute instances", "region 1", Scope::Regional, 2);
        assert_eq!(finding.summary(), "Compute instances found: 2 (region 1)");
    }

    #[test]
    fn test_global_summary_has_no_parenthetical() {
        let finding = Finding::new("Edge distributions", "us-east-1", Scope::Global, 1);
        assert_eq!(finding.summary(), "Edge distributions found: 1");
    }

    #[test]
    fn test_detail_replaces_region() {
        let finding = Finding::new("IAM Users", "us-east-1", Scope::Global, 2)
            .with_detail("alice, bob");
        assert_eq!(finding.summary(), "IAM Users found: 2 (alice, bob)");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = AccountOutcome::Aborted {
            account: "Account 1".to_string(),
            key_hint: "AKIAE...".to_string(),
            reason: "no regions".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "aborted");
        assert!(!outcome.has_findings());
    }
}
