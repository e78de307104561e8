// Board data model, in the server's JSON shape
//
// Field names on the wire follow the server (Portuguese keys); the Rust side uses
// English names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::BoardError;
use crate::pipeline::{ItemStatus, SideDataRequirement};

/// One stage of the board as returned by `fetch_workflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowGroup {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "orcamentos", default)]
    pub items: Vec<Item>,
}

/// A production order tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "cliente")]
    pub name: String,
    #[serde(rename = "grupo_id")]
    pub group_id: u64,
    #[serde(rename = "grupo_nome", default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(rename = "status_geral")]
    pub status: ItemStatus,
    #[serde(rename = "etapa1_descricao", default)]
    pub stage1_description: Option<String>,
    #[serde(rename = "etapa2_descricao", default)]
    pub stage2_description: Option<String>,
    #[serde(rename = "data_visita", default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(rename = "responsavel_visita", default)]
    pub visit_responsible: Option<String>,
    #[serde(rename = "data_instalacao", default)]
    pub install_date: Option<NaiveDate>,
    #[serde(rename = "responsavel_instalacao", default)]
    pub install_responsible: Option<String>,
    #[serde(rename = "data_entrada_producao", default)]
    pub production_entry_date: Option<NaiveDate>,
    #[serde(rename = "data_prevista_producao", default)]
    pub production_due_date: Option<NaiveDate>,
    #[serde(rename = "fase_instalada", default)]
    pub installed_phase: Option<InstalledPhase>,
    #[serde(rename = "arquivos", default)]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "tarefas", default)]
    pub subtasks: Vec<SubTask>,
}

impl Item {
    /// An item with no side-data, attachments or subtasks
    pub fn new(
        id: u64,
        number: impl Into<String>,
        name: impl Into<String>,
        group_id: u64,
        status: ItemStatus,
    ) -> Self {
        Self {
            id,
            number: number.into(),
            name: name.into(),
            group_id,
            group_name: None,
            status,
            stage1_description: None,
            stage2_description: None,
            visit_date: None,
            visit_responsible: None,
            install_date: None,
            install_responsible: None,
            production_entry_date: None,
            production_due_date: None,
            installed_phase: None,
            attachments: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    /// Store a side-data payload in the fields it describes
    pub fn apply_side_data(&mut self, side_data: &SideData) {
        match side_data {
            SideData::Visit { date, responsible } => {
                self.visit_date = Some(*date);
                self.visit_responsible = Some(responsible.clone());
            }
            SideData::Installation { date, responsible } => {
                self.install_date = Some(*date);
                self.install_responsible = Some(responsible.clone());
            }
            SideData::InstalledPhase { phase } => self.installed_phase = Some(*phase),
            SideData::ProductionRange {
                entry_date,
                due_date,
            } => {
                self.production_entry_date = Some(*entry_date);
                self.production_due_date = Some(*due_date);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: u64,
    #[serde(rename = "orcamento_id", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,
    #[serde(rename = "colaborador")]
    pub assignee: String,
    #[serde(rename = "item_descricao", default)]
    pub description: String,
    pub status: SubtaskStatus,
}

/// Subtask vocabulary, independent of any group vocabulary.
/// Aliases accept the legacy Portuguese values the server may still hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubtaskStatus {
    #[serde(rename = "Not Started", alias = "Não Iniciado")]
    NotStarted,
    #[serde(rename = "Started", alias = "Iniciou a Produção")]
    Started,
    #[serde(rename = "Finishing", alias = "Fase de Acabamento")]
    Finishing,
    #[serde(rename = "Finished", alias = "Produção Finalizada")]
    Finished,
    #[serde(rename = "Hold")]
    Hold,
}

impl SubtaskStatus {
    pub const ALL: [SubtaskStatus; 5] = [
        SubtaskStatus::NotStarted,
        SubtaskStatus::Started,
        SubtaskStatus::Finishing,
        SubtaskStatus::Finished,
        SubtaskStatus::Hold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubtaskStatus::NotStarted => "Not Started",
            SubtaskStatus::Started => "Started",
            SubtaskStatus::Finishing => "Finishing",
            SubtaskStatus::Finished => "Finished",
            SubtaskStatus::Hold => "Hold",
        }
    }

    pub fn is_initial(self) -> bool {
        self == SubtaskStatus::NotStarted
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtaskStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SubtaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == wanted)
            .ok_or_else(|| BoardError::UnknownStatus(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    #[serde(rename = "nome_arquivo")]
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstalledPhase {
    #[serde(rename = "Phase 1")]
    Phase1,
    #[serde(rename = "Phase 2")]
    Phase2,
}

impl InstalledPhase {
    pub fn label(self) -> &'static str {
        match self {
            InstalledPhase::Phase1 => "Phase 1",
            InstalledPhase::Phase2 => "Phase 2",
        }
    }
}

impl fmt::Display for InstalledPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InstalledPhase {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "phase 1" => Ok(InstalledPhase::Phase1),
            "2" | "phase 2" => Ok(InstalledPhase::Phase2),
            other => Err(BoardError::InvalidSideData(format!(
                "installed phase must be 'Phase 1' or 'Phase 2', got '{other}'"
            ))),
        }
    }
}

/// Side-data payload attached to a transition command. Serialized flat, with the
/// same keys the item carries once the server stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SideData {
    Visit {
        #[serde(rename = "data_visita")]
        date: NaiveDate,
        #[serde(rename = "responsavel_visita")]
        responsible: String,
    },
    Installation {
        #[serde(rename = "data_instalacao")]
        date: NaiveDate,
        #[serde(rename = "responsavel_instalacao")]
        responsible: String,
    },
    InstalledPhase {
        #[serde(rename = "fase_instalada")]
        phase: InstalledPhase,
    },
    ProductionRange {
        #[serde(rename = "data_entrada_producao")]
        entry_date: NaiveDate,
        #[serde(rename = "data_prevista_producao")]
        due_date: NaiveDate,
    },
}

impl SideData {
    /// The requirement this payload satisfies.
    pub fn requirement(&self) -> SideDataRequirement {
        match self {
            SideData::Visit { .. } => SideDataRequirement::VisitScheduling,
            SideData::Installation { .. } => SideDataRequirement::InstallationScheduling,
            SideData::InstalledPhase { .. } => SideDataRequirement::InstalledPhaseSelection,
            SideData::ProductionRange { .. } => SideDataRequirement::ProductionDateRange,
        }
    }
}

/// Fields for the manual item-creation command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "etapa1_descricao", default, skip_serializing_if = "Option::is_none")]
    pub stage1_description: Option<String>,
    #[serde(rename = "etapa2_descricao", default, skip_serializing_if = "Option::is_none")]
    pub stage2_description: Option<String>,
    #[serde(rename = "itens_producao", default)]
    pub selected_production_items: Vec<ProductionItem>,
}

/// A production subtask selected at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionItem {
    #[serde(rename = "colaborador")]
    pub assignee: String,
    #[serde(rename = "item")]
    pub description: String,
}

impl FromStr for ProductionItem {
    type Err = BoardError;

    /// Parses `assignee=description`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((assignee, description)) if !assignee.trim().is_empty() => Ok(ProductionItem {
                assignee: assignee.trim().to_string(),
                description: description.trim().to_string(),
            }),
            _ => Err(BoardError::InvalidSideData(format!(
                "production item must look like 'assignee=description', got '{s}'"
            ))),
        }
    }
}
