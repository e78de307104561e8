use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::{with_board_session, Command};
use crate::cli::CaptureArgs;
use crate::config::BoardConfig;

pub struct AttachCommand {
    config: BoardConfig,
    item: u64,
    file: PathBuf,
}

impl AttachCommand {
    pub fn new(config: BoardConfig, item: u64, file: PathBuf) -> Self {
        Self { config, item, file }
    }
}

impl Command for AttachCommand {
    async fn execute(&self) -> Result<()> {
        let item_id = self.item;
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            println!("📎 Uploading {}...", self.file.display());
            let item = session.add_attachment(item_id, &self.file).await?;
            println!(
                "✅ #{} {} has {} attachments",
                item.id,
                item.number,
                item.attachments.len()
            );
            Ok(())
        })
        .await
    }
}

pub struct ImportCommand {
    config: BoardConfig,
    archive: PathBuf,
}

impl ImportCommand {
    pub fn new(config: BoardConfig, archive: PathBuf) -> Self {
        Self { config, archive }
    }
}

impl Command for ImportCommand {
    async fn execute(&self) -> Result<()> {
        with_board_session(&self.config, &CaptureArgs::default(), |session| async move {
            println!("📦 Importing {}...", self.archive.display());
            let item = session.import_batch(&self.archive).await?;
            println!(
                "✅ Created #{} {} for {} ({} subtasks, {} attachments)",
                item.id,
                item.number,
                item.name,
                item.subtasks.len(),
                item.attachments.len()
            );
            Ok(())
        })
        .await
    }
}
