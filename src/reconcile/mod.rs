// Reconciliation loop
//
// The server is the single source of truth. After every command (accepted or not)
// the whole board is fetched again and the local snapshot replaced wholesale. This is
// the only writer of the snapshot; readers subscribe to the watch channel or take a
// cloned Arc.

pub mod snapshot;

pub use snapshot::{BoardSnapshot, GroupView};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::WorkflowApi;
use crate::errors::Result;
use crate::observability::BoardMetrics;
use crate::pipeline::PipelineDefinition;

pub struct Reconciler<A> {
    api: Arc<A>,
    pipeline: Arc<PipelineDefinition>,
    sender: watch::Sender<Arc<BoardSnapshot>>,
    revision: AtomicU64,
    metrics: Arc<BoardMetrics>,
}

impl<A: WorkflowApi> Reconciler<A> {
    pub fn new(api: Arc<A>, pipeline: Arc<PipelineDefinition>) -> Self {
        let (sender, _) = watch::channel(Arc::new(BoardSnapshot::empty()));
        Self {
            api,
            pipeline,
            sender,
            revision: AtomicU64::new(0),
            metrics: Arc::new(BoardMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<BoardMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.sender.subscribe()
    }

    /// The snapshot as of the last successful reconciliation
    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.sender.borrow().clone()
    }

    /// Fetch the full board once and replace the snapshot.
    ///
    /// There is no request fencing: when reconciliations overlap, the one whose fetch
    /// resolves last determines the snapshot. A failed fetch keeps the previous
    /// snapshot and returns the error.
    pub async fn reconcile(&self) -> Result<Arc<BoardSnapshot>> {
        let groups = match self.api.fetch_workflow().await {
            Ok(groups) => groups,
            Err(e) => {
                self.metrics.record_reconciliation(false);
                warn!(error = %e, "Board fetch failed; keeping previous snapshot");
                return Err(e);
            }
        };

        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = match BoardSnapshot::from_groups(&self.pipeline, groups, revision) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                self.metrics.record_reconciliation(false);
                warn!(error = %e, "Fetched board does not fit the pipeline");
                return Err(e);
            }
        };

        for problem in snapshot.inconsistencies() {
            warn!(revision, %problem, "Board inconsistency");
        }

        self.sender.send_replace(Arc::clone(&snapshot));
        self.metrics.record_reconciliation(true);

        if revision == 1 {
            info!(items = snapshot.item_count(), "Board loaded");
        } else {
            debug!(revision, items = snapshot.item_count(), "Board snapshot replaced");
        }
        Ok(snapshot)
    }
}
