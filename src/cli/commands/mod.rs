use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{BufReader, Stderr, Stdin};

use crate::board::{BoardSession, TransitionOutcome};
use crate::capture::PromptCollector;
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;
use crate::errors::BoardError;
use crate::http::HttpWorkflowApi;
use crate::pipeline::PipelineDefinition;

pub mod board;
pub mod check_config;
pub mod create;
pub mod files;
pub mod subtask;
pub mod transition;

pub use board::{BoardCommand, StatusesCommand};
pub use check_config::CheckConfigCommand;
pub use create::CreateCommand;
pub use files::{AttachCommand, ImportCommand};
pub use subtask::{AddSubtaskCommand, SubtaskCommand};
pub use transition::{MoveCommand, StatusCommand};

/// Session used by the command line: HTTP to the server, prompts on stdin/stderr
pub type CliSession = BoardSession<HttpWorkflowApi, PromptCollector<BufReader<Stdin>, Stderr>>;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// The configured pipeline, with failures reported as configuration errors
pub fn load_pipeline(config: &BoardConfig) -> Result<PipelineDefinition> {
    config
        .load_pipeline()
        .map_err(|e| BoardError::Config(format!("{e:#}")).into())
}

/// Connect to the board server, load the board, and run `f` against the session
pub async fn with_board_session<F, Fut, R>(config: &BoardConfig, capture: &CaptureArgs, f: F) -> Result<R>
where
    F: FnOnce(Arc<CliSession>) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let pipeline = Arc::new(load_pipeline(config)?);
    let api = Arc::new(HttpWorkflowApi::new(&config.server)?);
    let collector = PromptCollector::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stderr(),
        config.capture.clone(),
    )
    .with_prefilled(capture.events())
    .with_auto_confirm(capture.yes);

    let session = Arc::new(BoardSession::new(api, Arc::new(collector), pipeline));

    print!("🔄 Connecting to {}... ", config.server.base_url);
    std::io::Write::flush(&mut std::io::stdout())?;

    match session.refresh().await {
        Ok(snapshot) => {
            println!("✅ ({} items)", snapshot.item_count());
        }
        Err(e) => {
            println!("❌");
            return Err(e.into());
        }
    }

    let result = f(Arc::clone(&session)).await;
    session.metrics().log_stats();
    result
}

/// Print the result of a status change or move
pub fn report_transition(session: &CliSession, outcome: &TransitionOutcome) {
    match outcome {
        TransitionOutcome::Applied(item) => {
            let group = session
                .snapshot()
                .group_by_id(item.group_id)
                .map(|group| group.kind.to_string())
                .or_else(|| item.group_name.clone())
                .unwrap_or_else(|| format!("group {}", item.group_id));
            println!(
                "✅ #{} {} is now '{}' in {}",
                item.id, item.number, item.status, group
            );
        }
        TransitionOutcome::Cancelled => {
            println!("🚫 Cancelled. Nothing was sent; the board was reloaded.");
        }
    }
}

pub async fn show_how_to_use() -> Result<()> {
    println!("🏭 Pipeline Board - production order tracking");
    println!();
    println!("To get started:");
    println!("  📋 pipeline-board board                     # See every group and item");
    println!("  🔎 pipeline-board statuses <item>           # Statuses the item's group offers");
    println!("  🔀 pipeline-board status <item> <status>    # Change an item's status");
    println!("  🚚 pipeline-board move <item> <group>       # Move an item to another group");
    println!("  🛠️  pipeline-board subtask <id> <status>     # Update a production subtask");
    println!();
    println!("Intake:");
    println!("  ➕ pipeline-board create --number N --client C");
    println!("  📦 pipeline-board import <archive.zip>");
    println!("  📎 pipeline-board attach <item> <file>");
    println!();
    println!("💡 Run 'pipeline-board check-config' to validate your setup");
    Ok(())
}
