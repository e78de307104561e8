// Pipeline Board Library - production order tracking against a board server
// This exposes the core components for testing and integration

pub mod aggregation;
pub mod api;
pub mod board;
pub mod capture;
pub mod cli;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod reconcile;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use aggregation::{aggregate_status, forced_transition, group_by_assignee, AggregateStatus, ForcedTransition};
pub use api::WorkflowApi;
#[cfg(any(test, feature = "testing"))]
pub use api::MockWorkflowApi;
pub use board::{render_board, BoardSession, SubtaskOutcome, TransitionOutcome};
pub use capture::{CaptureEvent, CaptureSession, ChannelCollector, Collected, PromptCollector, SideDataCollector};
pub use config::BoardConfig;
pub use errors::{BoardError, Result};
pub use http::HttpWorkflowApi;
pub use models::{Attachment, InstalledPhase, Item, NewItem, ProductionItem, SideData, SubTask, SubtaskStatus, WorkflowGroup};
pub use observability::{BoardMetrics, OperationTimer};
pub use pipeline::{GroupKind, ItemStatus, PipelineDefinition, SideDataRequirement};
pub use reconcile::{BoardSnapshot, GroupView, Reconciler};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use workflows::{evaluate, offered_statuses, Decision, Proposal};
