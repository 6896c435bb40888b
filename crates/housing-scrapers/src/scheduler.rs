use async_trait::async_trait;
use futures::FutureExt;
use housing_core::{Database, Result};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::orchestrator::{panic_message, Orchestrator};

/// Work the scheduler repeats.
#[async_trait]
pub trait ScheduledRun: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Sequential scrape of every source into the store.
pub struct OrchestratorJob {
    orchestrator: Arc<Orchestrator>,
    db: Database,
}

impl OrchestratorJob {
    pub fn new(orchestrator: Arc<Orchestrator>, db: Database) -> Self {
        Self { orchestrator, db }
    }
}

#[async_trait]
impl ScheduledRun for OrchestratorJob {
    async fn run(&self) -> Result<()> {
        let summary = self.orchestrator.run_all_to_db(&self.db).await?;
        summary.ensure_persisted()
    }
}

/// Background loop: run, wait `interval`, run again, until shut down.
///
/// Runs never overlap. Shutdown interrupts both the wait and a run in
/// progress; an interrupted run is dropped where it stands.
pub struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(job: Arc<dyn ScheduledRun>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        info!(interval_secs = interval.as_secs(), "Starting scheduler");
        let handle = tokio::spawn(run_loop(job, interval, cancel.clone()));
        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        info!("Scheduler stopped");
    }
}

async fn run_loop(job: Arc<dyn ScheduledRun>, interval: Duration, cancel: CancellationToken) {
    loop {
        let run = AssertUnwindSafe(job.run()).catch_unwind();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Scheduler cancelled during run");
                return;
            }
            outcome = run => match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Scheduled run failed"),
                Err(panic) => error!(panic = %panic_message(&panic), "Scheduled run panicked"),
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
