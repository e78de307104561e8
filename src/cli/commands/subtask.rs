use anyhow::Result;

use crate::cli::commands::{with_board_session, Command};
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;
use crate::models::SubtaskStatus;

pub struct SubtaskCommand {
    config: BoardConfig,
    subtask: u64,
    status: SubtaskStatus,
}

impl SubtaskCommand {
    pub fn new(config: BoardConfig, subtask: u64, status: SubtaskStatus) -> Self {
        Self {
            config,
            subtask,
            status,
        }
    }
}

impl Command for SubtaskCommand {
    async fn execute(&self) -> Result<()> {
        let (subtask_id, status) = (self.subtask, self.status);
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            println!("🛠️  Setting subtask {subtask_id} to '{status}'...");
            let outcome = session.change_subtask_status(subtask_id, status).await?;

            println!(
                "✅ #{} {} is '{}'",
                outcome.item.id, outcome.item.number, outcome.item.status
            );
            if let Some(group) = outcome.promoted_to {
                println!("🚀 The server moved #{} to {group}", outcome.item.id);
            }
            if let Some(forced) = outcome.forced {
                match (&outcome.forced_item, &outcome.forced_error) {
                    (Some(_), _) => println!("⏸️  Parent put on '{}'", forced.to),
                    (None, Some(e)) => {
                        println!("⚠️  Subtask saved, but putting the parent on '{}' failed: {e}", forced.to)
                    }
                    (None, None) => {}
                }
            }
            Ok(())
        })
        .await
    }
}

pub struct AddSubtaskCommand {
    config: BoardConfig,
    item: u64,
    assignee: String,
    description: String,
}

impl AddSubtaskCommand {
    pub fn new(config: BoardConfig, item: u64, assignee: String, description: String) -> Self {
        Self {
            config,
            item,
            assignee,
            description,
        }
    }
}

impl Command for AddSubtaskCommand {
    async fn execute(&self) -> Result<()> {
        let item_id = self.item;
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            let item = session
                .add_subtask(item_id, &self.assignee, &self.description)
                .await?;
            println!(
                "✅ #{} {} now has {} subtasks",
                item.id,
                item.number,
                item.subtasks.len()
            );
            Ok(())
        })
        .await
    }
}
