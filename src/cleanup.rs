//! Deferred, best-effort deletion of job artifacts.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::SplitError;

/// Outcome of one deletion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub missing: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Handle to a scheduled deletion. Dropping it does not cancel the deletion.
#[derive(Debug)]
pub struct ScheduledCleanup {
    fired: oneshot::Receiver<CleanupReport>,
}

impl ScheduledCleanup {
    /// Wait until the deletion has run. `None` if the runtime shut down first.
    pub async fn fired(self) -> Option<CleanupReport> {
        self.fired.await.ok()
    }
}

/// Registers deletions that run once a delay has passed.
///
/// Scheduled deletions are not cancellable and always eventually fire.
pub trait CleanupScheduler: Send + Sync {
    fn schedule_deletion(&self, paths: Vec<PathBuf>, after: Duration) -> ScheduledCleanup;
}

/// [`CleanupScheduler`] running each deletion on its own tokio task.
#[derive(Debug, Clone, Default)]
pub struct TokioCleanupScheduler;

impl TokioCleanupScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl CleanupScheduler for TokioCleanupScheduler {
    fn schedule_deletion(&self, paths: Vec<PathBuf>, after: Duration) -> ScheduledCleanup {
        let (tx, rx) = oneshot::channel();

        debug!(
            "Scheduling deletion of {} path(s) in {}s",
            paths.len(),
            after.as_secs()
        );

        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let report = delete_paths(&paths).await;
            info!(
                "Cleanup fired: {} removed, {} already gone, {} failed",
                report.removed, report.missing, report.failed
            );
            let _ = tx.send(report);
        });

        ScheduledCleanup { fired: rx }
    }
}

/// Delete every path, treating "not found" as success. Failures are logged, never returned.
pub async fn delete_paths(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                report.removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.missing += 1;
            }
            Err(e) => {
                let err = SplitError::Cleanup(format!("{}: {e}", path.display()));
                warn!("{}", err);
                report.failed += 1;
            }
        }
    }

    report
}
