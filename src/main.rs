use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use pipeline_board::cli::commands::{
    show_how_to_use, AddSubtaskCommand, AttachCommand, BoardCommand, CheckConfigCommand, Command,
    CreateCommand, ImportCommand, MoveCommand, StatusCommand, StatusesCommand, SubtaskCommand,
};
use pipeline_board::cli::{Cli, Commands};
use pipeline_board::errors::{to_exit_code, BoardError};
use pipeline_board::models::NewItem;
use pipeline_board::{init_telemetry, BoardConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            let code = e.downcast_ref::<BoardError>().map(to_exit_code).unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    BoardConfig::load_env_file()?;
    let mut config = BoardConfig::load().map_err(|e| BoardError::Config(format!("{e:#}")))?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    init_telemetry(&config.observability)?;

    match cli.command {
        // Default behavior: no subcommand - explain how to use the board
        None => show_how_to_use().await,
        Some(Commands::Board) => BoardCommand::new(config).execute().await,
        Some(Commands::Statuses { item }) => StatusesCommand::new(config, item).execute().await,
        Some(Commands::Status {
            item,
            status,
            capture,
        }) => StatusCommand::new(config, item, status, capture).execute().await,
        Some(Commands::Move {
            item,
            group,
            capture,
        }) => MoveCommand::new(config, item, group, capture).execute().await,
        Some(Commands::Subtask { subtask, status }) => {
            SubtaskCommand::new(config, subtask, status).execute().await
        }
        Some(Commands::Attach { item, file }) => AttachCommand::new(config, item, file).execute().await,
        Some(Commands::AddSubtask {
            item,
            assignee,
            description,
        }) => {
            AddSubtaskCommand::new(config, item, assignee, description)
                .execute()
                .await
        }
        Some(Commands::Create {
            number,
            client,
            stage1,
            stage2,
            production_items,
        }) => {
            let item = NewItem {
                number,
                client,
                stage1_description: stage1,
                stage2_description: stage2,
                selected_production_items: production_items,
            };
            CreateCommand::new(config, item).execute().await
        }
        Some(Commands::Import { archive }) => ImportCommand::new(config, archive).execute().await,
        Some(Commands::CheckConfig) => CheckConfigCommand::new(config).execute().await,
    }
}
