// Pipeline definition: the closed, validated configuration of groups, status
// vocabularies, side-data requirements and promotions.

pub mod definition;
pub mod standard;

pub use definition::{
    GroupKind, GroupSpec, ItemStatus, PipelineDefinition, PipelineFile, SideDataRequirement,
    StatusRule,
};
