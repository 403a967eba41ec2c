//! Check listing command

use cloudsweep_checks::{CheckRegistry, FilterTable, ResourceCheckSpec};
use cloudsweep_core::{Config, OutputFormat};
use serde::Serialize;

#[derive(Serialize)]
struct CheckEntry<'a> {
    #[serde(flatten)]
    spec: &'a ResourceCheckSpec,
    /// Reported only when a resource-specific rule matches
    filtered: bool,
    skipped: bool,
}

fn entries<'a>(registry: &'a CheckRegistry, filters: &FilterTable, config: &Config) -> Vec<CheckEntry<'a>> {
    registry
        .checks()
        .iter()
        .map(|spec| CheckEntry {
            spec,
            filtered: filters.has_rule(&spec.name),
            skipped: config.skip_checks.contains(&spec.name),
        })
        .collect()
}

pub fn run(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let registry = CheckRegistry::builtin();
    let filters = FilterTable::builtin();
    let entries = entries(&registry, &filters, config);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            println!(
                "{:<26} {:<15} {:<9} {:<29} {}",
                "NAME", "SERVICE", "SCOPE", "OPERATION", "RESULT KEY"
            );
            for entry in &entries {
                let mut notes = Vec::new();
                if entry.filtered {
                    notes.push("filtered");
                }
                if entry.skipped {
                    notes.push("skipped");
                }
                let notes = if notes.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", notes.join(", "))
                };

                println!(
                    "{:<26} {:<15} {:<9} {:<29} {}{}",
                    entry.spec.name,
                    entry.spec.service,
                    entry.spec.scope.to_string(),
                    entry.spec.operation,
                    entry.spec.result_key,
                    notes
                );
            }
            println!("\n{} checks", entries.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_mark_filters_and_skips() {
        let registry = CheckRegistry::builtin();
        let filters = FilterTable::builtin();
        let config = Config {
            skip_checks: vec!["Lambda".to_string()],
            ..Config::default()
        };

        let entries = entries(&registry, &filters, &config);
        assert_eq!(entries.len(), registry.len());

        let lambda = entries.iter().find(|e| e.spec.name == "Lambda").unwrap();
        assert!(lambda.skipped);
        assert!(!lambda.filtered);

        let iam = entries.iter().find(|e| e.spec.name == "IAM Users").unwrap();
        assert!(iam.filtered);

        let json = serde_json::to_value(iam).unwrap();
        assert_eq!(json["service"], "iam");
        assert_eq!(json["scope"], "global");
    }
}
