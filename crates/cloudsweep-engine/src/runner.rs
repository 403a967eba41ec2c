//! Account runner that sequences discovery, dispatch and aggregation

use crate::aggregator::ResultAggregator;
use crate::dispatcher::{TaskDispatcher, TaskOutcome};
use crate::regions::discover_regions;
use chrono::{DateTime, Utc};
use cloudsweep_checks::{CheckRegistry, FilterTable};
use cloudsweep_core::{
    Account, AccountOutcome, Config, NullProgressReporter, ProgressReporter, Result, ScanReport,
    SessionProvider, DEFAULT_ANCHOR_REGION, DEFAULT_MAX_WORKERS,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for the account runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Region for global checks and region discovery
    pub anchor_region: String,
    /// Worker threads per account scan
    pub max_workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            anchor_region: DEFAULT_ANCHOR_REGION.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl From<&Config> for RunnerConfig {
    fn from(config: &Config) -> Self {
        Self {
            anchor_region: config.anchor_region.clone(),
            max_workers: config.max_workers,
        }
    }
}

/// Scans accounts one at a time
pub struct AccountOrchestrator<'r> {
    sessions: &'r dyn SessionProvider,
    dispatcher: TaskDispatcher<'r>,
    config: RunnerConfig,
    progress: Arc<dyn ProgressReporter>,
}

impl<'r> AccountOrchestrator<'r> {
    /// Create a runner over `registry`, opening sessions through `sessions`
    pub fn new(
        registry: &'r CheckRegistry,
        filters: &'r FilterTable,
        sessions: &'r dyn SessionProvider,
        config: RunnerConfig,
    ) -> Result<Self> {
        let dispatcher = TaskDispatcher::new(registry, filters, config.anchor_region.clone(), config.max_workers)?;
        Ok(Self {
            sessions,
            dispatcher,
            config,
            progress: Arc::new(NullProgressReporter),
        })
    }

    /// Set the progress reporter
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Scan a single account to completion.
    ///
    /// Session and region-discovery failures abort only this account.
    pub fn scan_account(&self, account: &Account) -> AccountOutcome {
        let started_at = Utc::now();
        self.progress.account_started(account);
        info!("Scanning {} ({}) via {}", account.name, account.key_hint(), self.sessions.name());

        let outcome = match self.try_scan(account, started_at) {
            Ok(report) => {
                info!(
                    "Scan of {} completed: {} findings, {} diagnostics",
                    account.name,
                    report.lines.len(),
                    report.diagnostics.len()
                );
                AccountOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Aborting scan of {}: {}", account.name, e);
                AccountOutcome::Aborted {
                    account: account.name.clone(),
                    key_hint: account.key_hint(),
                    reason: e.to_string(),
                }
            }
        };

        self.progress.account_finished(&outcome);
        outcome
    }

    fn try_scan(&self, account: &Account, started_at: DateTime<Utc>) -> Result<ScanReport> {
        let session = self.sessions.open(account)?;
        let regions = discover_regions(session.as_ref(), &self.config.anchor_region)?;

        let tasks = self.dispatcher.plan(&regions);
        debug!(
            "{}: {} tasks across {} regions on {} workers",
            account.name,
            tasks.len(),
            regions.len(),
            self.dispatcher.max_workers()
        );
        self.progress.tasks_planned(account, tasks.len());

        let mut aggregator = ResultAggregator::new();
        self.dispatcher.dispatch(session.as_ref(), tasks, |outcome| {
            if let TaskOutcome::Failed(message) = &outcome {
                self.progress.diagnostic(account, message);
            }
            aggregator.record(outcome);
        });

        Ok(aggregator.finish(account, regions, started_at))
    }

    /// Scan `accounts` in order, handing each outcome to `sink` before the
    /// next account starts
    pub fn run<F>(&self, accounts: &[Account], mut sink: F)
    where
        F: FnMut(AccountOutcome),
    {
        info!("Starting audit of {} accounts", accounts.len());
        for account in accounts {
            sink(self.scan_account(account));
        }
    }

    /// Scan `accounts` in order and collect the outcomes
    pub fn run_all(&self, accounts: &[Account]) -> Vec<AccountOutcome> {
        let mut outcomes = Vec::with_capacity(accounts.len());
        self.run(accounts, |outcome| outcomes.push(outcome));
        outcomes
    }
}
