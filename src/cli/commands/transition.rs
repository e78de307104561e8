use anyhow::Result;

use crate::cli::commands::{report_transition, with_board_session, Command};
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;
use crate::pipeline::{GroupKind, ItemStatus};

pub struct StatusCommand {
    config: BoardConfig,
    item: u64,
    status: ItemStatus,
    capture: CaptureArgs,
}

impl StatusCommand {
    pub fn new(config: BoardConfig, item: u64, status: ItemStatus, capture: CaptureArgs) -> Self {
        Self {
            config,
            item,
            status,
            capture,
        }
    }
}

impl Command for StatusCommand {
    async fn execute(&self) -> Result<()> {
        let (item_id, status) = (self.item, self.status);
        with_board_session(&self.config, &self.capture, |session| async move {
            println!("🔀 Setting #{item_id} to '{status}'...");
            let outcome = session.change_status(item_id, status).await?;
            report_transition(&session, &outcome);
            Ok(())
        })
        .await
    }
}

pub struct MoveCommand {
    config: BoardConfig,
    item: u64,
    group: GroupKind,
    capture: CaptureArgs,
}

impl MoveCommand {
    pub fn new(config: BoardConfig, item: u64, group: GroupKind, capture: CaptureArgs) -> Self {
        Self {
            config,
            item,
            group,
            capture,
        }
    }
}

impl Command for MoveCommand {
    async fn execute(&self) -> Result<()> {
        let (item_id, group) = (self.item, self.group);
        with_board_session(&self.config, &self.capture, |session| async move {
            println!("🚚 Moving #{item_id} to {group}...");
            let outcome = session.move_item(item_id, group).await?;
            report_transition(&session, &outcome);
            Ok(())
        })
        .await
    }
}
