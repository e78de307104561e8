use anyhow::Result;

use crate::board::render_board;
use crate::cli::commands::{with_board_session, Command};
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;

pub struct BoardCommand {
    config: BoardConfig,
}

impl BoardCommand {
    pub fn new(config: BoardConfig) -> Self {
        Self { config }
    }
}

impl Command for BoardCommand {
    async fn execute(&self) -> Result<()> {
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            println!();
            print!("{}", render_board(&session.snapshot()));
            Ok(())
        })
        .await
    }
}

pub struct StatusesCommand {
    config: BoardConfig,
    item: u64,
}

impl StatusesCommand {
    pub fn new(config: BoardConfig, item: u64) -> Self {
        Self { config, item }
    }
}

impl Command for StatusesCommand {
    async fn execute(&self) -> Result<()> {
        let item_id = self.item;
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            let (group, statuses) = session.statuses_for(item_id)?;
            let snapshot = session.snapshot();
            let current = snapshot.item(item_id).map(|item| item.status);

            println!("📂 Item #{item_id} is in {group}");
            for status in statuses {
                let requirement = session.pipeline().requirement_for_status(status)?;
                let marker = if Some(status) == current { "👉" } else { "  " };
                if requirement.is_none() {
                    println!("   {marker} {status}");
                } else {
                    println!("   {marker} {status}  (asks for {requirement})");
                }
            }
            Ok(())
        })
        .await
    }
}
