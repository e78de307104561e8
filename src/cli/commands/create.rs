use anyhow::Result;

use crate::cli::commands::{with_board_session, Command};
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;
use crate::models::NewItem;

pub struct CreateCommand {
    config: BoardConfig,
    item: NewItem,
}

impl CreateCommand {
    pub fn new(config: BoardConfig, item: NewItem) -> Self {
        Self { config, item }
    }
}

impl Command for CreateCommand {
    async fn execute(&self) -> Result<()> {
        let new_item = self.item.clone();
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            println!("➕ Creating {} for {}...", new_item.number, new_item.client);
            let item = session.create_item(new_item).await?;
            println!("✅ Created #{} '{}' ({})", item.id, item.number, item.status);
            Ok(())
        })
        .await
    }
}
