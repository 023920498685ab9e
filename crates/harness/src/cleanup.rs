//! Post-test cleanup of tracked remote resources

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::DashboardClient;
use crate::tracker::{ResourceKind, TestResources};

/// Outcome of one cleanup call.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupOutcome {
    pub kind: ResourceKind,
    pub id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Per-identifier outcomes of one cleanup pass.
///
/// A failed outcome means the remote resource may have leaked; the suite can
/// persist the report for out-of-band housekeeping instead of relying on
/// warn-level logs alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub outcomes: Vec<CleanupOutcome>,
}

impl CleanupReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Drains a test's resource trackers after the test body has finished,
/// issuing one best-effort cleanup call per tracked identifier.
///
/// Intended to run from a finally-style hook so it fires whether the test
/// passed, failed, or panicked. Failures are isolated per identifier and
/// never propagate; the trackers are cleared unconditionally so nothing
/// leaks into the next test's cleanup pass.
pub struct CleanupCoordinator {
    client: DashboardClient,
}

impl CleanupCoordinator {
    pub fn new(client: DashboardClient) -> Self {
        Self { client }
    }

    /// Issue cleanup calls for every tracked identifier, one kind at a time,
    /// in insertion order within each kind. Always clears all trackers
    /// before returning.
    pub async fn run(&self, resources: &mut TestResources) -> CleanupReport {
        let mut report = CleanupReport::default();

        for kind in ResourceKind::ALL {
            for id in resources.tracker(kind).list() {
                let result = match kind {
                    ResourceKind::Session => self.client.close_session(&id).await,
                    ResourceKind::Issue => self.client.delete_issue(&id).await,
                };

                match result {
                    Ok(()) => {
                        report.outcomes.push(CleanupOutcome {
                            kind,
                            id,
                            success: true,
                            error: None,
                        });
                    }
                    Err(e) => {
                        warn!("Cleanup of {} {} failed: {}", kind, id, e);
                        report.outcomes.push(CleanupOutcome {
                            kind,
                            id,
                            success: false,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }
        }

        resources.clear_all();

        if report.attempted() > 0 {
            info!(
                "Cleanup finished: {} attempted, {} failed",
                report.attempted(),
                report.failed()
            );
        }

        report
    }

    /// Run a test body, then clean up whether it returned or panicked.
    ///
    /// There is no after-each hook in the host test framework, so this is
    /// the finally-style wrapper a test uses to get the unconditional
    /// cleanup guarantee. A panic is resurfaced after cleanup has run, so
    /// the test still fails with its original payload.
    pub async fn with_cleanup<Fut, T>(
        &self,
        resources: &mut TestResources,
        test_body: Fut,
    ) -> (T, CleanupReport)
    where
        Fut: Future<Output = T>,
    {
        let outcome = AssertUnwindSafe(test_body).catch_unwind().await;
        let report = self.run(resources).await;

        match outcome {
            Ok(value) => (value, report),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
