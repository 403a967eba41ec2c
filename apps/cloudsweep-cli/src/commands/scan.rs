//! Account scan command

use anyhow::Context;
use clap::Args;
use cloudsweep_aws::AwsSessionProvider;
use cloudsweep_checks::{CheckRegistry, FilterTable};
use cloudsweep_core::{
    load_accounts, Account, AccountOutcome, Config, OutputFormat, ProgressReporter,
};
use cloudsweep_engine::{format_header, format_json, format_text, AccountOrchestrator, RunnerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Args, Default)]
pub struct ScanArgs {
    /// Credential file, one ACCESS_KEY<TAB>SECRET_KEY per line
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Region for global checks and region discovery
    #[arg(long)]
    anchor_region: Option<String>,

    /// Concurrent checks per account
    #[arg(long)]
    max_workers: Option<usize>,

    /// Checks to skip, by name
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Exit with status 1 if any account has findings
    #[arg(long)]
    fail_on_findings: bool,
}

impl ScanArgs {
    /// Apply command-line overrides on top of the loaded config
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.credentials {
            config.credentials_file = path.clone();
        }
        if let Some(region) = &self.anchor_region {
            config.anchor_region = region.clone();
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        for name in &self.skip {
            if !config.skip_checks.contains(name) {
                config.skip_checks.push(name.clone());
            }
        }
    }
}

/// Streams the per-account text report as each account finishes
struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn account_started(&self, account: &Account) {
        println!("\n{}", format_header(&account.name, &account.key_hint()));
    }

    fn tasks_planned(&self, _account: &Account, _total: usize) {}

    fn diagnostic(&self, _account: &Account, _message: &str) {}

    fn account_finished(&self, outcome: &AccountOutcome) {
        print!("{}", format_text(outcome));
    }
}

/// Load accounts, or `None` when the file holds no valid record
fn accounts_to_scan(config: &Config) -> anyhow::Result<Option<Vec<Account>>> {
    let accounts = load_accounts(&config.credentials_file).with_context(|| {
        format!(
            "cannot read credentials from {}; create it next to the binary or pass --credentials",
            config.credentials_file.display()
        )
    })?;
    debug!(
        "Loaded {} accounts from {}",
        accounts.len(),
        config.credentials_file.display()
    );
    Ok((!accounts.is_empty()).then_some(accounts))
}

pub fn run(args: ScanArgs, mut config: Config, format: OutputFormat) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let Some(accounts) = accounts_to_scan(&config)? else {
        println!(
            "No accounts to scan. Check {}.",
            config.credentials_file.display()
        );
        return Ok(());
    };

    let registry = CheckRegistry::builtin().without(&config.skip_checks);
    let filters = FilterTable::builtin();
    let provider = AwsSessionProvider::new(&config).context("failed to start the AWS runtime")?;

    let mut runner = AccountOrchestrator::new(&registry, &filters, &provider, RunnerConfig::from(&config))?;
    if format == OutputFormat::Text {
        println!("cloudsweep: scanning {} accounts", accounts.len());
        runner = runner.with_progress(Arc::new(ConsoleProgress));
    }

    let outcomes = runner.run_all(&accounts);

    if format == OutputFormat::Json {
        println!("{}", format_json(&outcomes, true)?);
    }

    // Exit with error code if requested and anything was found
    if args.fail_on_findings && outcomes.iter().any(AccountOutcome::has_findings) {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config() {
        let args = ScanArgs {
            credentials: Some(PathBuf::from("/tmp/keys.txt")),
            max_workers: Some(4),
            skip: vec!["Lambda".to_string(), "VPC".to_string()],
            ..ScanArgs::default()
        };
        let mut config = Config {
            skip_checks: vec!["VPC".to_string()],
            ..Config::default()
        };

        args.apply(&mut config);
        assert_eq!(config.credentials_file, PathBuf::from("/tmp/keys.txt"));
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.anchor_region, "us-east-1");
        assert_eq!(config.skip_checks, vec!["VPC".to_string(), "Lambda".to_string()]);
    }

    #[test]
    fn test_missing_credentials_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScanArgs {
            credentials: Some(dir.path().join("accesskey.txt")),
            ..ScanArgs::default()
        };

        let err = run(args, Config::default(), OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("cannot read credentials"));
    }

    #[test]
    fn test_empty_credentials_file_scans_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# no accounts yet\n\nnot-a-record").unwrap();
        let config = Config {
            credentials_file: file.path().to_path_buf(),
            ..Config::default()
        };

        assert!(accounts_to_scan(&config).unwrap().is_none());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let args = ScanArgs {
            max_workers: Some(0),
            ..ScanArgs::default()
        };
        assert!(run(args, Config::default(), OutputFormat::Json).is_err());
    }
}
