use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::capture::CaptureEvent;
use crate::models::{InstalledPhase, ProductionItem, SubtaskStatus};
use crate::pipeline::{GroupKind, ItemStatus};

pub mod commands;

#[derive(Parser)]
#[command(name = "pipeline-board")]
#[command(about = "Client for the production pipeline board")]
#[command(long_about = "Moves production orders through the pipeline stages stored on the board server. \
                       Every change is sent to the server and followed by a full reload of the board. \
                       Start with 'pipeline-board board' to see where everything stands.")]
pub struct Cli {
    /// Board server base URL, overriding configuration
    #[arg(long, global = true, help = "Board server base URL (overrides server.base_url)")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every group and its items
    Board,
    /// List the statuses an item's current group offers
    Statuses {
        /// Item id
        item: u64,
    },
    /// Change an item's status
    Status {
        /// Item id
        item: u64,
        /// New status, by display name (e.g. "Visita Agendada")
        status: ItemStatus,
        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Move an item into another group
    Move {
        /// Item id
        item: u64,
        /// Destination group, by display name (e.g. "Linha de Produção")
        group: GroupKind,
        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Change a production subtask's status
    Subtask {
        /// Subtask id
        subtask: u64,
        /// New status: "Not Started", "Started", "Finishing", "Finished" or "Hold"
        status: SubtaskStatus,
    },
    /// Attach a file to an item
    Attach {
        /// Item id
        item: u64,
        /// File to upload
        file: PathBuf,
    },
    /// Add a production subtask to an item
    AddSubtask {
        /// Item id
        item: u64,
        /// Collaborator on the production roster
        assignee: String,
        /// What to produce
        description: String,
    },
    /// Create an item manually
    Create {
        #[arg(long, help = "Order number")]
        number: String,
        #[arg(long, help = "Client name")]
        client: String,
        #[arg(long, help = "First stage description")]
        stage1: Option<String>,
        #[arg(long, help = "Second stage description")]
        stage2: Option<String>,
        /// Production subtasks as assignee=description, repeatable
        #[arg(long = "production-item", help = "Production subtask as 'assignee=description' (repeatable)")]
        production_items: Vec<ProductionItem>,
    },
    /// Upload a .zip batch (manifest plus files) for the server to ingest
    Import {
        /// Archive to upload
        archive: PathBuf,
    },
    /// Validate configuration and the pipeline definition without contacting the server
    CheckConfig,
}

/// Side-data given up front. Anything missing is prompted for on stdin.
#[derive(Args, Debug, Clone, Default)]
pub struct CaptureArgs {
    #[arg(long, help = "Visit or installation date (YYYY-MM-DD)")]
    pub date: Option<NaiveDate>,
    #[arg(long, help = "Visit or installation responsible")]
    pub responsible: Option<String>,
    #[arg(long, help = "Production entry date (YYYY-MM-DD, defaults to today)")]
    pub entry_date: Option<NaiveDate>,
    #[arg(long, help = "Production duration in days")]
    pub days: Option<u32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Production duration preset, numbered from 1")]
    pub preset: Option<u32>,
    #[arg(long, help = "Installed phase: 1 or 2")]
    pub phase: Option<InstalledPhase>,
    #[arg(short = 'y', long, help = "Confirm the given values without prompting")]
    pub yes: bool,
}

impl CaptureArgs {
    pub fn events(&self) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        if let Some(date) = self.date {
            events.push(CaptureEvent::SetDate(date));
        }
        if let Some(responsible) = &self.responsible {
            events.push(CaptureEvent::SetResponsible(responsible.clone()));
        }
        if let Some(entry_date) = self.entry_date {
            events.push(CaptureEvent::SetEntryDate(entry_date));
        }
        if let Some(days) = self.days {
            events.push(CaptureEvent::SetDays(days));
        }
        if let Some(preset) = self.preset {
            events.push(CaptureEvent::SelectPreset(preset as usize - 1));
        }
        if let Some(phase) = self.phase {
            events.push(CaptureEvent::ChoosePhase(phase));
        }
        events
    }
}
