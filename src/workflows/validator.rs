// Transition Validator
//
// Decides legality, the side-data requirement, and where the item ends up.

use crate::errors::{BoardError, Result};
use crate::models::Item;
use crate::pipeline::{GroupKind, ItemStatus, PipelineDefinition, SideDataRequirement};

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// Pick a status from the item's current group
    SetStatus(ItemStatus),
    /// Drag the item into another group
    MoveTo(GroupKind),
}

/// Outcome of evaluating an accepted proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub requirement: SideDataRequirement,
    pub destination: GroupKind,
    /// Status the item holds once the transition is committed
    pub resulting_status: ItemStatus,
    pub changes_group: bool,
}

/// Evaluate a proposal against an item's current (group, status).
///
/// A status outside the current group's vocabulary is rejected with
/// `InvalidStatus`. Moves look up their requirement by destination group only, so a
/// move into production always needs the production date range.
pub fn evaluate(
    pipeline: &PipelineDefinition,
    current_group: GroupKind,
    current_status: ItemStatus,
    proposal: Proposal,
) -> Result<Decision> {
    match proposal {
        Proposal::SetStatus(status) => {
            if !pipeline.is_legal(current_group, status) {
                return Err(BoardError::InvalidStatus {
                    status,
                    group: current_group,
                });
            }

            let requirement = pipeline.requirement_for_status(status)?;
            let destination = pipeline.promotion_for(status)?.unwrap_or(current_group);

            Ok(Decision {
                requirement,
                destination,
                resulting_status: status,
                changes_group: destination != current_group,
            })
        }
        Proposal::MoveTo(destination) => {
            let requirement = pipeline.requirement_for_move(destination)?;
            let resulting_status = if pipeline.is_legal(destination, current_status) {
                current_status
            } else {
                pipeline.initial_status(destination).ok_or_else(|| {
                    BoardError::Config(format!("group '{destination}' has an empty vocabulary"))
                })?
            };

            Ok(Decision {
                requirement,
                destination,
                resulting_status,
                changes_group: destination != current_group,
            })
        }
    }
}

/// Evaluate a proposal for an item sitting in `group`
pub fn evaluate_item(
    pipeline: &PipelineDefinition,
    group: GroupKind,
    item: &Item,
    proposal: Proposal,
) -> Result<Decision> {
    evaluate(pipeline, group, item.status, proposal)
}

/// The statuses a group offers for selection
pub fn offered_statuses(pipeline: &PipelineDefinition, group: GroupKind) -> &[ItemStatus] {
    pipeline.vocabulary(group)
}
