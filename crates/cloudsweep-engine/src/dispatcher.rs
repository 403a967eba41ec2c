//! Fan-out of (check, region) tasks over a bounded worker pool

use cloudsweep_checks::{CheckRegistry, FilterInput, FilterTable, ResourceCheckSpec};
use cloudsweep_core::{ApiError, CloudSession, CloudsweepError, Finding, Region, Result, Scope};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use tracing::{debug, warn};

/// One check to run in one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTask<'r> {
    pub spec: &'r ResourceCheckSpec,
    pub region: Region,
}

impl ScanTask<'_> {
    /// `<check> @ <region>`, used in logs and diagnostics
    pub fn label(&self) -> String {
        format!("{} @ {}", self.spec.name, self.region)
    }
}

/// How a single task ended
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The filter flagged something
    Finding(Finding),
    /// Listing succeeded, nothing to report
    Clean,
    /// A provider error was swallowed
    Absorbed(ApiError),
    /// Unexpected error, surfaced as a diagnostic line
    Failed(String),
}

/// Expand the registry against the region set.
///
/// Global checks run once from `anchor_region`; regional checks run once per
/// region. Tasks come out in registry order, then region order.
pub fn plan_tasks<'r>(
    registry: &'r CheckRegistry,
    regions: &[Region],
    anchor_region: &str,
) -> Vec<ScanTask<'r>> {
    let mut tasks = Vec::new();
    for spec in registry.checks() {
        match spec.scope {
            Scope::Global => tasks.push(ScanTask {
                spec,
                region: anchor_region.to_string(),
            }),
            Scope::Regional => tasks.extend(regions.iter().map(|region| ScanTask {
                spec,
                region: region.clone(),
            })),
        }
    }
    tasks
}

fn execute(session: &dyn CloudSession, filters: &FilterTable, task: &ScanTask<'_>) -> Result<Option<Finding>> {
    let filter = filters.get(&task.spec.name);
    let client = session.client(&task.spec.service, &task.region)?;
    let response = client.invoke(&task.spec.operation, &filter.params())?;

    filter.evaluate(&FilterInput {
        spec: task.spec,
        region: &task.region,
        response: &response,
        client: client.as_ref(),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run one task to completion, converting every failure into an outcome
pub fn run_task(session: &dyn CloudSession, filters: &FilterTable, task: &ScanTask<'_>) -> TaskOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| execute(session, filters, task)))
        .unwrap_or_else(|payload| Err(CloudsweepError::TaskPanicked(panic_message(payload.as_ref()))));

    match result {
        Ok(Some(finding)) => TaskOutcome::Finding(finding),
        Ok(None) => TaskOutcome::Clean,
        Err(CloudsweepError::Api(e)) => {
            debug!("{}: ignoring provider error ({}): {}", task.label(), e.kind(), e);
            TaskOutcome::Absorbed(e)
        }
        Err(e) => {
            let msg = format!("{}: {}", task.label(), e);
            warn!("Check failed: {}", msg);
            TaskOutcome::Failed(msg)
        }
    }
}

/// Executes scan tasks on a fixed-size worker pool
pub struct TaskDispatcher<'r> {
    registry: &'r CheckRegistry,
    filters: &'r FilterTable,
    anchor_region: String,
    pool: rayon::ThreadPool,
}

impl<'r> TaskDispatcher<'r> {
    /// Create a dispatcher with `max_workers` worker threads
    pub fn new(
        registry: &'r CheckRegistry,
        filters: &'r FilterTable,
        anchor_region: impl Into<String>,
        max_workers: usize,
    ) -> Result<Self> {
        if max_workers == 0 {
            return Err(CloudsweepError::Config("max_workers must be at least 1".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("cloudsweep-worker-{}", i))
            .build()
            .map_err(|e| CloudsweepError::Config(format!("cannot start worker pool: {}", e)))?;

        Ok(Self {
            registry,
            filters,
            anchor_region: anchor_region.into(),
            pool,
        })
    }

    /// Number of worker threads
    pub fn max_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Task list for `regions`
    pub fn plan(&self, regions: &[Region]) -> Vec<ScanTask<'r>> {
        plan_tasks(self.registry, regions, &self.anchor_region)
    }

    /// Run every task and hand each outcome to `on_outcome` as it completes.
    ///
    /// `on_outcome` runs on the calling thread, so it needs no synchronization.
    /// Returns once all tasks have finished.
    pub fn dispatch<F>(&self, session: &dyn CloudSession, tasks: Vec<ScanTask<'r>>, mut on_outcome: F)
    where
        F: FnMut(TaskOutcome),
    {
        let filters = self.filters;
        let (tx, rx) = mpsc::channel();

        self.pool.in_place_scope(|scope| {
            for task in tasks {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = run_task(session, filters, &task);
                    // The receiver outlives every sender
                    let _ = tx.send(outcome);
                });
            }
            drop(tx);

            for outcome in rx {
                on_outcome(outcome);
            }
        });
    }
}
