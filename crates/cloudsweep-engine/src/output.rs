//! Output formatting for account outcomes

use cloudsweep_core::{AccountOutcome, Result};

/// Section header printed when an account scan starts
pub fn format_header(account: &str, key_hint: &str) -> String {
    format!("--- [{} / Key: {}] scan started ---", account, key_hint)
}

/// Format an account outcome as text: findings or the clean message, any
/// diagnostics, and a footer. The header is printed separately, before the
/// scan runs.
pub fn format_text(outcome: &AccountOutcome) -> String {
    let mut output = String::new();

    match outcome {
        AccountOutcome::Completed(report) => {
            if report.is_clean() {
                output.push_str("  [OK] Account is clean. No notable resources found.\n");
            } else {
                output.push_str("  [WARN] The following resources were found:\n");
                for line in &report.lines {
                    output.push_str(&format!("    - {}\n", line));
                }
            }

            if !report.diagnostics.is_empty() {
                output.push_str(&format!(
                    "  [ERROR] {} check(s) failed unexpectedly:\n",
                    report.diagnostics.len()
                ));
                for diagnostic in &report.diagnostics {
                    output.push_str(&format!("    - {}\n", diagnostic));
                }
            }

            output.push_str(&format!(
                "--- [{}] scan complete ({} regions, {} tasks, {:.1}s) ---\n",
                report.account,
                report.regions.len(),
                report.stats.total,
                (report.completed_at - report.started_at).num_milliseconds() as f64 / 1000.0
            ));
        }
        AccountOutcome::Aborted { account, reason, .. } => {
            output.push_str(&format!("  [ERROR] {}\n", reason));
            output.push_str(&format!("--- [{}] scan aborted ---\n", account));
        }
    }

    output
}

/// Format account outcomes as a JSON array
pub fn format_json(outcomes: &[AccountOutcome], pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(outcomes).map_err(Into::into)
    } else {
        serde_json::to_string(outcomes).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cloudsweep_core::{ScanReport, TaskStats};

    fn report(lines: &[&str], diagnostics: &[&str]) -> AccountOutcome {
        let now = Utc::now();
        AccountOutcome::Completed(ScanReport {
            account: "Account 2".to_string(),
            key_hint: "AKIAE...".to_string(),
            regions: vec!["eu-north-1".to_string(), "us-east-1".to_string()],
            lines: lines.iter().map(|l| l.to_string()).collect(),
            findings: Vec::new(),
            diagnostics: diagnostics.iter().map(|d| d.to_string()).collect(),
            stats: TaskStats {
                total: 39,
                ..TaskStats::default()
            },
            started_at: now,
            completed_at: now,
        })
    }

    #[test]
    fn test_header() {
        assert_eq!(
            format_header("Account 1", "AKIAE..."),
            "--- [Account 1 / Key: AKIAE...] scan started ---"
        );
    }

    #[test]
    fn test_clean_account() {
        let text = format_text(&report(&[], &[]));
        assert!(text.contains("[OK] Account is clean"));
        assert!(!text.contains("[ERROR]"));
        assert!(text.ends_with("--- [Account 2] scan complete (2 regions, 39 tasks, 0.0s) ---\n"));
    }

    #[test]
    fn test_findings_listed_in_order() {
        let text = format_text(&report(
            &["EBS Volumes found: 2 (us-east-1)", "Lambda found: 1 (eu-north-1)"],
            &["VPC @ us-east-1: Malformed response for Vpcs: expected array"],
        ));
        let volumes = text.find("    - EBS Volumes").unwrap();
        let lambda = text.find("    - Lambda").unwrap();
        assert!(volumes < lambda);
        assert!(text.contains("[ERROR] 1 check(s) failed unexpectedly"));
        assert!(!text.contains("Account is clean"));
    }

    #[test]
    fn test_aborted_account() {
        let outcome = AccountOutcome::Aborted {
            account: "Account 3".to_string(),
            key_hint: "AKIAZ...".to_string(),
            reason: "Region discovery failed: denied".to_string(),
        };
        assert_eq!(
            format_text(&outcome),
            "  [ERROR] Region discovery failed: denied\n--- [Account 3] scan aborted ---\n"
        );
    }

    #[test]
    fn test_json_array() {
        let json = format_json(&[report(&["Lambda found: 1 (r1)"], &[])], false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["status"], "completed");
        assert_eq!(parsed[0]["lines"][0], "Lambda found: 1 (r1)");
    }
}
