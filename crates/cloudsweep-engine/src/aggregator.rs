//! Collects task outcomes into a deterministic report

use crate::dispatcher::TaskOutcome;
use chrono::{DateTime, Utc};
use cloudsweep_core::{Account, Finding, Region, ScanReport, TaskStats};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Accumulates outcomes in arrival order; the report it produces does not
/// depend on that order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    findings: BTreeMap<String, Finding>,
    diagnostics: Vec<String>,
    stats: TaskStats,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task outcome
    pub fn record(&mut self, outcome: TaskOutcome) {
        self.stats.total += 1;
        match outcome {
            TaskOutcome::Finding(finding) => {
                self.stats.with_findings += 1;
                match self.findings.entry(finding.summary()) {
                    Entry::Vacant(slot) => {
                        slot.insert(finding);
                    }
                    // Same line from different tasks: keep the lowest region
                    Entry::Occupied(mut slot) => {
                        if finding.region < slot.get().region {
                            slot.insert(finding);
                        }
                    }
                }
            }
            TaskOutcome::Clean => self.stats.clean += 1,
            TaskOutcome::Absorbed(_) => self.stats.absorbed += 1,
            TaskOutcome::Failed(message) => {
                self.stats.failed += 1;
                self.diagnostics.push(message);
            }
        }
    }

    /// Sorted, deduplicated finding lines recorded so far
    pub fn lines(&self) -> Vec<String> {
        self.findings.keys().cloned().collect()
    }

    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    /// Produce the final report for `account`
    pub fn finish(self, account: &Account, regions: Vec<Region>, started_at: DateTime<Utc>) -> ScanReport {
        let mut diagnostics = self.diagnostics;
        diagnostics.sort();
        diagnostics.dedup();

        let (lines, findings): (Vec<String>, Vec<Finding>) = self.findings.into_iter().unzip();

        ScanReport {
            account: account.name.clone(),
            key_hint: account.key_hint(),
            regions,
            lines,
            findings,
            diagnostics,
            stats: self.stats,
            started_at,
            completed_at: Utc::now(),
        }
    }
}

impl Extend<TaskOutcome> for ResultAggregator {
    fn extend<T: IntoIterator<Item = TaskOutcome>>(&mut self, iter: T) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsweep_core::testing::access_denied;
    use cloudsweep_core::Scope;

    fn account() -> Account {
        Account::new("Account 1", "AKIAEXAMPLE", "secret")
    }

    fn ec2(region: &str, count: usize) -> TaskOutcome {
        TaskOutcome::Finding(Finding::new("EC2 Instances", region, Scope::Regional, count))
    }

    #[test]
    fn test_lines_sorted_regardless_of_arrival() {
        let outcomes = vec![
            ec2("us-west-2", 1),
            TaskOutcome::Finding(Finding::new("CloudFront (Enabled)", "us-east-1", Scope::Global, 1)),
            ec2("eu-north-1", 3),
        ];

        let mut forward = ResultAggregator::new();
        forward.extend(outcomes.clone());
        let mut reverse = ResultAggregator::new();
        reverse.extend(outcomes.into_iter().rev());

        let expected = vec![
            "CloudFront (Enabled) found: 1".to_string(),
            "EC2 Instances found: 1 (us-west-2)".to_string(),
            "EC2 Instances found: 3 (eu-north-1)".to_string(),
        ];
        assert_eq!(forward.lines(), expected);
        assert_eq!(reverse.lines(), expected);
    }

    #[test]
    fn test_duplicate_lines_collapse() {
        let detail = |region: &str| {
            TaskOutcome::Finding(
                Finding::new("IAM Users", region, Scope::Global, 1).with_detail("alice"),
            )
        };

        let mut aggregator = ResultAggregator::new();
        aggregator.extend([detail("us-west-2"), detail("us-east-1"), detail("us-west-2")]);

        let report = aggregator.finish(&account(), vec![], Utc::now());
        assert_eq!(report.lines, vec!["IAM Users found: 1 (alice)".to_string()]);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].region, "us-east-1");
        assert_eq!(report.stats.with_findings, 3);
    }

    #[test]
    fn test_stats_and_diagnostics() {
        let mut aggregator = ResultAggregator::new();
        aggregator.extend([
            TaskOutcome::Failed("VPC @ b: malformed".to_string()),
            TaskOutcome::Clean,
            TaskOutcome::Absorbed(access_denied()),
            ec2("a", 2),
            TaskOutcome::Failed("AMI @ a: boom".to_string()),
        ]);

        let report = aggregator.finish(&account(), vec!["a".to_string(), "b".to_string()], Utc::now());
        assert_eq!(
            report.stats,
            TaskStats {
                total: 5,
                with_findings: 1,
                clean: 1,
                absorbed: 1,
                failed: 2,
            }
        );
        assert_eq!(report.diagnostics, vec!["AMI @ a: boom", "VPC @ b: malformed"]);
        assert_eq!(report.key_hint, "AKIAE...");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_is_clean() {
        let report = ResultAggregator::new().finish(&account(), vec![], Utc::now());
        assert!(report.is_clean());
        assert!(report.diagnostics.is_empty());
    }
}
