use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineDefinition;

/// Main configuration structure for the board client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board server connection
    pub server: ServerConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Side-data capture defaults
    pub capture: CaptureConfig,
    /// Pipeline definition source
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the board server, e.g. http://localhost:5001
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
    /// Client-side request pacing
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Production-duration presets offered when capturing the due date, in days
    pub due_date_presets: Vec<u32>,
    /// Production duration used when none is chosen, in days
    pub default_production_days: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// TOML file replacing the standard pipeline
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            request_timeout_seconds: 30,
            requests_per_second: 10,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            due_date_presets: vec![15, 30, 45, 60],
            default_production_days: 30,
        }
    }
}

impl BoardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (pipeline-board.toml, .pipeline-board-rc)
    /// 3. Environment variables (prefixed with PIPELINE_BOARD_, sections split by __)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("pipeline-board.toml").exists() {
            builder = builder.add_source(File::with_name("pipeline-board"));
        }

        if Path::new(".pipeline-board-rc").exists() {
            builder = builder.add_source(
                File::with_name(".pipeline-board-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("PIPELINE_BOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let board_config: BoardConfig = config.try_deserialize()?;
        board_config.check()?;
        Ok(board_config)
    }

    /// Reject values that would only fail later at first use
    pub fn check(&self) -> Result<()> {
        if self.server.requests_per_second == 0 {
            anyhow::bail!("server.requests_per_second must be positive");
        }
        if self.capture.default_production_days == 0 {
            anyhow::bail!("capture.default_production_days must be positive");
        }
        if self.capture.due_date_presets.iter().any(|days| *days == 0) {
            anyhow::bail!("capture.due_date_presets must only contain positive day counts");
        }
        Ok(())
    }

    /// The standard pipeline, or the one named by `pipeline.file`, validated
    pub fn load_pipeline(&self) -> Result<PipelineDefinition> {
        let pipeline = match &self.pipeline.file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading pipeline file {}", path.display()))?;
                PipelineDefinition::from_toml_str(&content)?
            }
            None => PipelineDefinition::standard()?,
        };
        tracing::debug!(groups = pipeline.groups_in_order().len(), "Pipeline definition loaded");
        Ok(pipeline)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
