// Board Session
//
// Every user action follows the same path: locate the target in the current snapshot,
// validate locally, collect side-data when the transition needs it, send exactly one
// command, then reconcile once whether the command succeeded or not. A side-data step
// that ends without a payload reconciles the same way.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn, Instrument};

use crate::aggregation::{forced_transition, ForcedTransition};
use crate::api::WorkflowApi;
use crate::capture::{ensure_matches, Collected, SideDataCollector};
use crate::errors::{BoardError, Result};
use crate::models::{Item, NewItem, SideData, SubtaskStatus};
use crate::observability::{BoardMetrics, OperationTimer};
use crate::pipeline::{GroupKind, ItemStatus, PipelineDefinition, SideDataRequirement};
use crate::reconcile::{BoardSnapshot, Reconciler};
use crate::telemetry::{create_command_span, generate_correlation_id};
use crate::workflows::{evaluate_item, offered_statuses, Proposal};

/// Result of a user-initiated transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The server accepted the command; the item as it now stands
    Applied(Item),
    /// The user cancelled side-data collection; nothing was sent
    Cancelled,
}

/// Result of a subtask status change, including any effect on the parent item
#[derive(Debug)]
pub struct SubtaskOutcome {
    /// Parent item as returned by the subtask command
    pub item: Item,
    /// Group the server moved the parent into, when it changed
    pub promoted_to: Option<GroupKind>,
    pub forced: Option<ForcedTransition>,
    /// Parent after the forced command, when it was accepted
    pub forced_item: Option<Item>,
    /// Failure of the forced command. The subtask change itself stands.
    pub forced_error: Option<BoardError>,
}

enum Capture {
    Ready(Option<SideData>),
    Cancelled,
}

pub struct BoardSession<A, C> {
    api: Arc<A>,
    collector: Arc<C>,
    pipeline: Arc<PipelineDefinition>,
    reconciler: Reconciler<A>,
    metrics: Arc<BoardMetrics>,
}

impl<A, C> BoardSession<A, C>
where
    A: WorkflowApi,
    C: SideDataCollector,
{
    pub fn new(api: Arc<A>, collector: Arc<C>, pipeline: Arc<PipelineDefinition>) -> Self {
        let metrics = Arc::new(BoardMetrics::new());
        let reconciler =
            Reconciler::new(Arc::clone(&api), Arc::clone(&pipeline)).with_metrics(metrics.clone());
        Self {
            api,
            collector,
            pipeline,
            reconciler,
            metrics,
        }
    }

    pub fn pipeline(&self) -> &PipelineDefinition {
        &self.pipeline
    }

    pub fn metrics(&self) -> &BoardMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.reconciler.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.reconciler.subscribe()
    }

    /// Explicit re-synchronization with the server
    pub async fn refresh(&self) -> Result<Arc<BoardSnapshot>> {
        self.reconciler.reconcile().await
    }

    /// The item's group and the statuses that group offers
    pub fn statuses_for(&self, item_id: u64) -> Result<(GroupKind, Vec<ItemStatus>)> {
        let snapshot = self.snapshot();
        let (group, _) = snapshot
            .item_with_group(item_id)
            .ok_or(BoardError::UnknownItem(item_id))?;
        Ok((
            group.kind,
            offered_statuses(&self.pipeline, group.kind).to_vec(),
        ))
    }

    pub async fn change_status(&self, item_id: u64, status: ItemStatus) -> Result<TransitionOutcome> {
        let snapshot = self.snapshot();
        let (group, item) = snapshot
            .item_with_group(item_id)
            .ok_or(BoardError::UnknownItem(item_id))?;
        let decision = evaluate_item(&self.pipeline, group.kind, item, Proposal::SetStatus(status))?;

        let side_data = match self.capture(decision.requirement).await {
            Ok(Capture::Ready(side_data)) => side_data,
            Ok(Capture::Cancelled) => return self.cancelled("change_item_status", item_id).await,
            Err(e) => return self.aborted("change_item_status", item_id, e).await,
        };

        let updated = self
            .commit(
                "change_item_status",
                Some(item_id),
                self.api
                    .change_item_status(item_id, decision.resulting_status, side_data),
            )
            .await?;

        if decision.changes_group {
            info!(
                item_id,
                status = %status,
                destination = %decision.destination,
                "Status change promoted item to another group"
            );
        }
        Ok(TransitionOutcome::Applied(updated))
    }

    pub async fn move_item(&self, item_id: u64, destination: GroupKind) -> Result<TransitionOutcome> {
        let snapshot = self.snapshot();
        let (group, item) = snapshot
            .item_with_group(item_id)
            .ok_or(BoardError::UnknownItem(item_id))?;
        let destination_id = snapshot
            .group(destination)
            .ok_or_else(|| BoardError::UnknownGroup(destination.to_string()))?
            .id;
        let decision = evaluate_item(&self.pipeline, group.kind, item, Proposal::MoveTo(destination))?;

        let side_data = match self.capture(decision.requirement).await {
            Ok(Capture::Ready(side_data)) => side_data,
            Ok(Capture::Cancelled) => return self.cancelled("move_item", item_id).await,
            Err(e) => return self.aborted("move_item", item_id, e).await,
        };

        let updated = self
            .commit(
                "move_item",
                Some(item_id),
                self.api
                    .move_item(item_id, destination_id, decision.resulting_status, side_data),
            )
            .await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// Change a subtask, then apply whatever the change forces on the parent.
    ///
    /// A subtask put on hold sends a second, independent status command moving the
    /// parent into its group's hold status, followed by its own reconciliation.
    pub async fn change_subtask_status(
        &self,
        subtask_id: u64,
        status: SubtaskStatus,
    ) -> Result<SubtaskOutcome> {
        let snapshot = self.snapshot();
        let (parent, _) = snapshot
            .subtask(subtask_id)
            .ok_or(BoardError::UnknownSubtask(subtask_id))?;
        let parent_id = parent.id;
        let group_before = snapshot.item_with_group(parent_id).map(|(group, _)| group.kind);

        let item = self
            .commit(
                "change_subtask_status",
                Some(parent_id),
                self.api.change_subtask_status(subtask_id, status),
            )
            .await?;

        let current = self.snapshot();
        let group_now = current
            .group_by_id(item.group_id)
            .map(|group| group.kind)
            .or_else(|| {
                item.group_name
                    .as_deref()
                    .and_then(|name| self.pipeline.kind_by_name(name))
            });

        let promoted_to = match (group_before, group_now) {
            (Some(before), Some(now)) if before != now => {
                info!(
                    item_id = parent_id,
                    from = %before,
                    to = %now,
                    "Server promoted item after subtask change"
                );
                Some(now)
            }
            _ => None,
        };

        let mut outcome = SubtaskOutcome {
            item,
            promoted_to,
            forced: None,
            forced_item: None,
            forced_error: None,
        };

        let Some(group) = group_now else {
            if status == SubtaskStatus::Hold {
                warn!(item_id = parent_id, "Parent group unknown; hold not propagated");
            }
            return Ok(outcome);
        };

        if let Some(forced) = forced_transition(&self.pipeline, status, group, outcome.item.status) {
            info!(
                item_id = parent_id,
                from = %forced.from,
                to = %forced.to,
                "Subtask on hold; forcing parent into hold status"
            );
            self.metrics.record_forced_transition();
            outcome.forced = Some(forced);

            match self
                .commit(
                    "change_item_status",
                    Some(parent_id),
                    self.api.change_item_status(parent_id, forced.to, None),
                )
                .await
            {
                Ok(held) => outcome.forced_item = Some(held),
                Err(e) => {
                    warn!(item_id = parent_id, error = %e, "Forced hold was not applied");
                    outcome.forced_error = Some(e);
                }
            }
        }

        Ok(outcome)
    }

    pub async fn add_attachment(&self, item_id: u64, path: &Path) -> Result<Item> {
        self.require_item(item_id)?;
        let filename = file_name(path)?;
        let contents = tokio::fs::read(path).await?;

        self.commit(
            "add_attachment",
            Some(item_id),
            self.api.add_attachment(item_id, filename, contents),
        )
        .await
    }

    pub async fn add_subtask(&self, item_id: u64, assignee: &str, description: &str) -> Result<Item> {
        self.require_item(item_id)?;
        let assignee = self.roster_name(assignee)?;

        self.commit(
            "add_subtask",
            Some(item_id),
            self.api
                .add_subtask(item_id, assignee, description.trim().to_string()),
        )
        .await
    }

    pub async fn create_item(&self, mut item: NewItem) -> Result<Item> {
        for production_item in &mut item.selected_production_items {
            production_item.assignee = self.roster_name(&production_item.assignee)?;
        }

        self.commit("create_item", None, self.api.create_item(item))
            .await
    }

    /// Upload a batch archive (.zip with a manifest) for the server to ingest
    pub async fn import_batch(&self, path: &Path) -> Result<Item> {
        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            return Err(BoardError::InvalidArchive(format!(
                "{} is not a .zip archive",
                path.display()
            )));
        }

        let filename = file_name(path)?;
        let archive = tokio::fs::read(path).await?;
        self.commit("import_batch", None, self.api.import_batch(filename, archive))
            .await
    }

    fn require_item(&self, item_id: u64) -> Result<()> {
        match self.snapshot().item(item_id) {
            Some(_) => Ok(()),
            None => Err(BoardError::UnknownItem(item_id)),
        }
    }

    fn roster_name(&self, assignee: &str) -> Result<String> {
        self.pipeline
            .roster_name(assignee)
            .map(str::to_string)
            .ok_or_else(|| BoardError::UnknownAssignee(assignee.trim().to_string()))
    }

    async fn capture(&self, requirement: SideDataRequirement) -> Result<Capture> {
        if requirement.is_none() {
            return Ok(Capture::Ready(None));
        }

        let collected = self.collector.collect(requirement).await?;
        ensure_matches(requirement, &collected)?;
        Ok(match collected {
            Collected::Payload(side_data) => Capture::Ready(Some(side_data)),
            Collected::Cancelled => Capture::Cancelled,
        })
    }

    async fn cancelled(&self, command: &str, item_id: u64) -> Result<TransitionOutcome> {
        info!(command, item_id, "Side-data capture cancelled; nothing sent");
        self.metrics.record_cancellation();
        self.reconcile_after(command).await;
        Ok(TransitionOutcome::Cancelled)
    }

    /// Side-data capture failed; the board is reloaded as after a failed command
    async fn aborted(&self, command: &str, item_id: u64, error: BoardError) -> Result<TransitionOutcome> {
        warn!(command, item_id, error = %error, "Side-data capture failed; nothing sent");
        self.reconcile_after(command).await;
        Err(error)
    }

    /// Send one command, then reconcile once regardless of its result
    async fn commit<T, F>(&self, command: &str, item_id: Option<u64>, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let correlation_id = generate_correlation_id();
        let span = create_command_span(command, item_id, &correlation_id);

        async {
            let timer = OperationTimer::new(command);
            self.metrics.record_command();

            let result = request.await;
            match &result {
                Ok(_) => info!(command, "Command accepted"),
                Err(e @ BoardError::CommandRejected { .. }) => {
                    self.metrics.record_rejection();
                    warn!(command, error = %e, "Command rejected");
                }
                Err(e @ BoardError::NetworkFailure(_)) => {
                    self.metrics.record_network_failure();
                    warn!(command, error = %e, "Command did not reach the server");
                }
                Err(e) => warn!(command, error = %e, "Command failed"),
            }

            self.reconcile_after(command).await;
            timer.finish();
            result
        }
        .instrument(span)
        .await
    }

    async fn reconcile_after(&self, command: &str) {
        if let Err(e) = self.reconciler.reconcile().await {
            warn!(command, error = %e, "Reconciliation failed; board may be stale until next refresh");
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BoardError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} does not name a file", path.display()),
            ))
        })
}
