use anyhow::Result;

use crate::cli::commands::{load_pipeline, Command};
use crate::config::BoardConfig;

pub struct CheckConfigCommand {
    config: BoardConfig,
}

impl CheckConfigCommand {
    pub fn new(config: BoardConfig) -> Self {
        Self { config }
    }
}

impl Command for CheckConfigCommand {
    async fn execute(&self) -> Result<()> {
        println!("🔍 Checking configuration...");
        let pipeline = load_pipeline(&self.config)?;

        println!("   🌐 Server: {}", self.config.server.base_url);
        match &self.config.pipeline.file {
            Some(path) => println!("   📄 Pipeline: {}", path.display()),
            None => println!("   📄 Pipeline: standard"),
        }
        for kind in pipeline.groups_in_order() {
            let vocabulary: Vec<&str> = pipeline
                .vocabulary(kind)
                .iter()
                .map(|status| status.as_str())
                .collect();
            let hold = pipeline
                .hold_status(kind)
                .map(|status| format!(", hold '{status}'"))
                .unwrap_or_default();
            println!("   📂 {kind}: {}{hold}", vocabulary.join(", "));
        }
        println!("   👷 Roster: {}", pipeline.assignees().join(", "));
        println!(
            "   📅 Production presets: {:?} days (default {})",
            self.config.capture.due_date_presets, self.config.capture.default_production_days
        );
        println!();
        println!("✅ Configuration is valid");
        Ok(())
    }
}
