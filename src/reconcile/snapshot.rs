use crate::errors::{BoardError, Result};
use crate::models::{Item, SubTask, WorkflowGroup};
use crate::pipeline::{GroupKind, PipelineDefinition};

/// One group of the board, matched to its pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub id: u64,
    pub kind: GroupKind,
    pub items: Vec<Item>,
}

/// Immutable copy of the authoritative board as of one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    revision: u64,
    groups: Vec<GroupView>,
    inconsistencies: Vec<String>,
}

impl BoardSnapshot {
    /// Snapshot held before the first successful fetch
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from the server's groups, kept in the order returned.
    ///
    /// Every server group must name a pipeline stage. Items whose stored status is
    /// not legal in their group are kept as they are and listed in
    /// `inconsistencies()`.
    pub fn from_groups(
        pipeline: &PipelineDefinition,
        groups: Vec<WorkflowGroup>,
        revision: u64,
    ) -> Result<Self> {
        let mut views = Vec::with_capacity(groups.len());
        let mut inconsistencies = Vec::new();

        for group in groups {
            let kind = pipeline.kind_by_name(&group.name).ok_or_else(|| {
                BoardError::Config(format!(
                    "server group '{}' does not match any pipeline stage",
                    group.name
                ))
            })?;

            for item in &group.items {
                if !pipeline.is_legal(kind, item.status) {
                    inconsistencies.push(format!(
                        "item {} ({}) has status '{}' which '{}' does not offer",
                        item.id, item.number, item.status, kind
                    ));
                }
                if item.group_id != group.id {
                    inconsistencies.push(format!(
                        "item {} ({}) is listed under group {} but records group {}",
                        item.id, item.number, group.id, item.group_id
                    ));
                }
            }

            views.push(GroupView {
                id: group.id,
                kind,
                items: group.items,
            });
        }

        Ok(Self {
            revision,
            groups: views,
            inconsistencies,
        })
    }

    /// Position of this snapshot in the sequence of replacements; 0 before the first fetch
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn groups(&self) -> &[GroupView] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn group(&self, kind: GroupKind) -> Option<&GroupView> {
        self.groups.iter().find(|group| group.kind == kind)
    }

    pub fn group_by_id(&self, id: u64) -> Option<&GroupView> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn item(&self, id: u64) -> Option<&Item> {
        self.item_with_group(id).map(|(_, item)| item)
    }

    pub fn item_with_group(&self, id: u64) -> Option<(&GroupView, &Item)> {
        self.groups.iter().find_map(|group| {
            group
                .items
                .iter()
                .find(|item| item.id == id)
                .map(|item| (group, item))
        })
    }

    /// A subtask together with its parent item
    pub fn subtask(&self, id: u64) -> Option<(&Item, &SubTask)> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .find_map(|item| {
                item.subtasks
                    .iter()
                    .find(|task| task.id == id)
                    .map(|task| (item, task))
            })
    }

    /// Items whose stored (group, status) break the pipeline rules
    pub fn inconsistencies(&self) -> &[String] {
        &self.inconsistencies
    }
}
