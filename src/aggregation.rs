// Subtask roll-up
//
// Derives an item's production status from its subtasks, and decides when a
// subtask change forces a change on its parent item.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Item, SubTask, SubtaskStatus};
use crate::pipeline::{GroupKind, ItemStatus, PipelineDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Production")]
    InProduction,
}

impl AggregateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateStatus::NotStarted => "Not Started",
            AggregateStatus::InProduction => "In Production",
        }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Not Started" while every subtask is still in its initial status (including when
/// there are none), "In Production" as soon as any has moved.
pub fn aggregate_status(subtasks: &[SubTask]) -> AggregateStatus {
    if subtasks.iter().all(|task| task.status.is_initial()) {
        AggregateStatus::NotStarted
    } else {
        AggregateStatus::InProduction
    }
}

/// Subtasks keyed by assignee, in assignee order, each list in input order
pub fn group_by_assignee(subtasks: &[SubTask]) -> BTreeMap<&str, Vec<&SubTask>> {
    let mut grouped: BTreeMap<&str, Vec<&SubTask>> = BTreeMap::new();
    for task in subtasks {
        grouped.entry(task.assignee.as_str()).or_default().push(task);
    }
    grouped
}

/// A parent status change implied by a subtask change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedTransition {
    pub group: GroupKind,
    pub from: ItemStatus,
    pub to: ItemStatus,
}

/// A subtask put on hold forces its parent into the hold status of the parent's group.
pub fn forced_transition(
    pipeline: &PipelineDefinition,
    new_subtask_status: SubtaskStatus,
    parent_group: GroupKind,
    parent_status: ItemStatus,
) -> Option<ForcedTransition> {
    if new_subtask_status != SubtaskStatus::Hold {
        return None;
    }

    let Some(hold) = pipeline.hold_status(parent_group) else {
        tracing::warn!(
            group = %parent_group,
            "Subtask put on hold but the group has no hold status; parent left as is"
        );
        return None;
    };

    if hold == parent_status {
        return None;
    }

    Some(ForcedTransition {
        group: parent_group,
        from: parent_status,
        to: hold,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionSummary {
    pub aggregate: AggregateStatus,
    pub total: usize,
    pub counts: BTreeMap<SubtaskStatus, usize>,
}

impl ProductionSummary {
    pub fn count(&self, status: SubtaskStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Every subtask finished (and there is at least one)
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.count(SubtaskStatus::Finished) == self.total
    }

    pub fn on_hold(&self) -> bool {
        self.count(SubtaskStatus::Hold) > 0
    }
}

pub fn production_summary(item: &Item) -> ProductionSummary {
    let mut counts = BTreeMap::new();
    for task in &item.subtasks {
        *counts.entry(task.status).or_insert(0) += 1;
    }

    ProductionSummary {
        aggregate: aggregate_status(&item.subtasks),
        total: item.subtasks.len(),
        counts,
    }
}
