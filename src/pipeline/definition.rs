// Pipeline definition types and totality validation
//
// Every group and every status a group can offer must resolve to an explicit entry.
// A missing entry is a configuration error caught by `validate()` at startup, never
// something the transition code silently skips.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::{BoardError, Result};

/// The fixed set of pipeline stages. Display names match the server's group names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    #[serde(rename = "Entrada de Orçamento", alias = "Entrada de Orçamentos")]
    Intake,
    #[serde(rename = "Visitas e Medidas")]
    Visits,
    #[serde(rename = "Linha de Produção")]
    Production,
    #[serde(rename = "Prontos para Instalação")]
    ReadyToInstall,
    #[serde(rename = "Standby")]
    Standby,
    #[serde(rename = "Instalados")]
    Installed,
}

impl GroupKind {
    pub const ALL: [GroupKind; 6] = [
        GroupKind::Intake,
        GroupKind::Visits,
        GroupKind::Production,
        GroupKind::ReadyToInstall,
        GroupKind::Standby,
        GroupKind::Installed,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            GroupKind::Intake => "Entrada de Orçamento",
            GroupKind::Visits => "Visitas e Medidas",
            GroupKind::Production => "Linha de Produção",
            GroupKind::ReadyToInstall => "Prontos para Instalação",
            GroupKind::Standby => "Standby",
            GroupKind::Installed => "Instalados",
        }
    }

    /// Other spellings the server uses for the same stage
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            GroupKind::Intake => &["Entrada de Orçamentos"],
            _ => &[],
        }
    }

    /// Case-insensitive match against the display name or an alias
    pub fn matches_name(self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        std::iter::once(self.display_name())
            .chain(self.aliases().iter().copied())
            .any(|known| known.to_lowercase() == wanted)
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GroupKind {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        GroupKind::ALL
            .into_iter()
            .find(|kind| kind.matches_name(s))
            .ok_or_else(|| BoardError::UnknownGroup(s.trim().to_string()))
    }
}

/// Every status value a parent item can hold, across all groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "Novo")]
    Novo,
    #[serde(rename = "Orçamento Aprovado")]
    OrcamentoAprovado,
    #[serde(rename = "Visita Agendada")]
    VisitaAgendada,
    #[serde(rename = "Medidas Tiradas")]
    MedidasTiradas,
    #[serde(rename = "Em Produção")]
    EmProducao,
    #[serde(rename = "Produção Finalizada")]
    ProducaoFinalizada,
    #[serde(rename = "Aguardando Instalação")]
    AguardandoInstalacao,
    #[serde(rename = "Instalação Agendada")]
    InstalacaoAgendada,
    #[serde(rename = "Instalado")]
    Instalado,
    #[serde(rename = "Em Espera")]
    EmEspera,
    #[serde(rename = "Standby")]
    Standby,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 11] = [
        ItemStatus::Novo,
        ItemStatus::OrcamentoAprovado,
        ItemStatus::VisitaAgendada,
        ItemStatus::MedidasTiradas,
        ItemStatus::EmProducao,
        ItemStatus::ProducaoFinalizada,
        ItemStatus::AguardandoInstalacao,
        ItemStatus::InstalacaoAgendada,
        ItemStatus::Instalado,
        ItemStatus::EmEspera,
        ItemStatus::Standby,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Novo => "Novo",
            ItemStatus::OrcamentoAprovado => "Orçamento Aprovado",
            ItemStatus::VisitaAgendada => "Visita Agendada",
            ItemStatus::MedidasTiradas => "Medidas Tiradas",
            ItemStatus::EmProducao => "Em Produção",
            ItemStatus::ProducaoFinalizada => "Produção Finalizada",
            ItemStatus::AguardandoInstalacao => "Aguardando Instalação",
            ItemStatus::InstalacaoAgendada => "Instalação Agendada",
            ItemStatus::Instalado => "Instalado",
            ItemStatus::EmEspera => "Em Espera",
            ItemStatus::Standby => "Standby",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == wanted.to_lowercase())
            .ok_or_else(|| BoardError::UnknownStatus(wanted.to_string()))
    }
}

/// Shape of the extra information a transition needs before it can be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideDataRequirement {
    #[default]
    None,
    VisitScheduling,
    InstallationScheduling,
    InstalledPhaseSelection,
    ProductionDateRange,
}

impl SideDataRequirement {
    pub fn is_none(self) -> bool {
        self == SideDataRequirement::None
    }
}

impl fmt::Display for SideDataRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SideDataRequirement::None => "none",
            SideDataRequirement::VisitScheduling => "visit scheduling {date, responsible}",
            SideDataRequirement::InstallationScheduling => {
                "installation scheduling {date, responsible}"
            }
            SideDataRequirement::InstalledPhaseSelection => "installed phase (Phase 1 / Phase 2)",
            SideDataRequirement::ProductionDateRange => "production dates {entry, due}",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub position: u32,
    /// Ordered; the first entry is the group's initial status.
    pub vocabulary: Vec<ItemStatus>,
    pub hold_status: Option<ItemStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub requirement: SideDataRequirement,
    /// `None` keeps the item in its current group.
    pub promotes_to: Option<GroupKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDefinition {
    groups: BTreeMap<GroupKind, GroupSpec>,
    statuses: BTreeMap<ItemStatus, StatusRule>,
    moves: BTreeMap<GroupKind, SideDataRequirement>,
    assignees: Vec<String>,
}

impl PipelineDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(
        mut self,
        kind: GroupKind,
        position: u32,
        vocabulary: &[ItemStatus],
        hold_status: Option<ItemStatus>,
    ) -> Self {
        self.groups.insert(
            kind,
            GroupSpec {
                position,
                vocabulary: vocabulary.to_vec(),
                hold_status,
            },
        );
        self
    }

    pub fn with_status(
        mut self,
        status: ItemStatus,
        requirement: SideDataRequirement,
        promotes_to: Option<GroupKind>,
    ) -> Self {
        self.statuses.insert(
            status,
            StatusRule {
                requirement,
                promotes_to,
            },
        );
        self
    }

    pub fn with_move(mut self, destination: GroupKind, requirement: SideDataRequirement) -> Self {
        self.moves.insert(destination, requirement);
        self
    }

    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and return self, for use at construction sites.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Config(problems.join("; ")))
        }
    }

    /// Every totality or consistency problem in this definition (empty when valid).
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut positions = BTreeSet::new();

        for kind in GroupKind::ALL {
            match self.groups.get(&kind) {
                None => problems.push(format!("group '{kind}' has no definition")),
                Some(spec) => {
                    if spec.vocabulary.is_empty() {
                        problems.push(format!("group '{kind}' has an empty vocabulary"));
                    }

                    let mut seen = BTreeSet::new();
                    for status in &spec.vocabulary {
                        if !seen.insert(*status) {
                            problems.push(format!(
                                "group '{kind}' lists status '{status}' more than once"
                            ));
                        }
                        if !self.statuses.contains_key(status) {
                            problems.push(format!(
                                "status '{status}' offered by group '{kind}' has no rule"
                            ));
                        }
                    }

                    if let Some(hold) = spec.hold_status {
                        if !spec.vocabulary.contains(&hold) {
                            problems.push(format!(
                                "hold status '{hold}' is not in the vocabulary of group '{kind}'"
                            ));
                        }
                        if let Some(rule) = self.statuses.get(&hold) {
                            if !rule.requirement.is_none() {
                                problems.push(format!(
                                    "hold status '{hold}' of group '{kind}' requires side-data"
                                ));
                            }
                            if rule.promotes_to.is_some_and(|dest| dest != kind) {
                                problems.push(format!(
                                    "hold status '{hold}' of group '{kind}' moves the item out of the group"
                                ));
                            }
                        }
                    }

                    if !positions.insert(spec.position) {
                        problems.push(format!(
                            "group '{kind}' reuses position {}",
                            spec.position
                        ));
                    }
                }
            }

            if !self.moves.contains_key(&kind) {
                problems.push(format!("moves into group '{kind}' have no requirement entry"));
            }
        }

        for (status, rule) in &self.statuses {
            if let Some(destination) = rule.promotes_to {
                let legal_there = self
                    .groups
                    .get(&destination)
                    .is_some_and(|spec| spec.vocabulary.contains(status));
                if !legal_there {
                    problems.push(format!(
                        "status '{status}' promotes to '{destination}' which does not offer it"
                    ));
                }
            }
        }

        problems
    }

    pub fn vocabulary(&self, kind: GroupKind) -> &[ItemStatus] {
        self.groups
            .get(&kind)
            .map(|spec| spec.vocabulary.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_legal(&self, kind: GroupKind, status: ItemStatus) -> bool {
        self.vocabulary(kind).contains(&status)
    }

    pub fn requirement_for_status(&self, status: ItemStatus) -> Result<SideDataRequirement> {
        self.rule(status).map(|rule| rule.requirement)
    }

    pub fn promotion_for(&self, status: ItemStatus) -> Result<Option<GroupKind>> {
        self.rule(status).map(|rule| rule.promotes_to)
    }

    pub fn requirement_for_move(&self, destination: GroupKind) -> Result<SideDataRequirement> {
        self.moves.get(&destination).copied().ok_or_else(|| {
            BoardError::Config(format!(
                "moves into group '{destination}' have no requirement entry"
            ))
        })
    }

    pub fn hold_status(&self, kind: GroupKind) -> Option<ItemStatus> {
        self.groups.get(&kind).and_then(|spec| spec.hold_status)
    }

    pub fn initial_status(&self, kind: GroupKind) -> Option<ItemStatus> {
        self.vocabulary(kind).first().copied()
    }

    pub fn position(&self, kind: GroupKind) -> Option<u32> {
        self.groups.get(&kind).map(|spec| spec.position)
    }

    pub fn groups_in_order(&self) -> Vec<GroupKind> {
        let mut kinds: Vec<GroupKind> = self.groups.keys().copied().collect();
        kinds.sort_by_key(|kind| self.groups[kind].position);
        kinds
    }

    pub fn kind_by_name(&self, name: &str) -> Option<GroupKind> {
        GroupKind::from_str(name)
            .ok()
            .filter(|kind| self.groups.contains_key(kind))
    }

    pub fn assignees(&self) -> &[String] {
        &self.assignees
    }

    /// The roster spelling of `name`, matched case-insensitively after trimming
    pub fn roster_name(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.assignees
            .iter()
            .find(|assignee| assignee.to_lowercase() == wanted)
            .map(String::as_str)
    }

    fn rule(&self, status: ItemStatus) -> Result<StatusRule> {
        self.statuses
            .get(&status)
            .copied()
            .ok_or_else(|| BoardError::Config(format!("status '{status}' has no rule")))
    }

    /// Parse a pipeline from its TOML file form and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PipelineFile = toml::from_str(content)
            .map_err(|e| BoardError::Config(format!("invalid pipeline file: {e}")))?;
        PipelineDefinition::try_from(file)?.validated()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&PipelineFile::from(self))
            .map_err(|e| BoardError::Config(format!("cannot serialize pipeline: {e}")))
    }
}

/// On-disk form of a pipeline definition. Lists instead of maps so that duplicate
/// entries are visible and rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub assignees: Vec<String>,
    pub groups: Vec<GroupEntry>,
    pub statuses: Vec<StatusEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub kind: GroupKind,
    pub position: u32,
    pub vocabulary: Vec<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_status: Option<ItemStatus>,
    #[serde(default)]
    pub move_requirement: SideDataRequirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: ItemStatus,
    #[serde(default)]
    pub requirement: SideDataRequirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotes_to: Option<GroupKind>,
}

impl TryFrom<PipelineFile> for PipelineDefinition {
    type Error = BoardError;

    fn try_from(file: PipelineFile) -> Result<Self> {
        let mut pipeline = PipelineDefinition::new().with_assignees(file.assignees);

        for entry in file.groups {
            if pipeline.groups.contains_key(&entry.kind) {
                return Err(BoardError::Config(format!(
                    "group '{}' is defined more than once",
                    entry.kind
                )));
            }
            pipeline = pipeline
                .with_group(entry.kind, entry.position, &entry.vocabulary, entry.hold_status)
                .with_move(entry.kind, entry.move_requirement);
        }

        for entry in file.statuses {
            if pipeline.statuses.contains_key(&entry.status) {
                return Err(BoardError::Config(format!(
                    "status '{}' is defined more than once",
                    entry.status
                )));
            }
            pipeline = pipeline.with_status(entry.status, entry.requirement, entry.promotes_to);
        }

        Ok(pipeline)
    }
}

impl From<&PipelineDefinition> for PipelineFile {
    fn from(pipeline: &PipelineDefinition) -> Self {
        let groups = pipeline
            .groups_in_order()
            .into_iter()
            .map(|kind| {
                let spec = &pipeline.groups[&kind];
                GroupEntry {
                    kind,
                    position: spec.position,
                    vocabulary: spec.vocabulary.clone(),
                    hold_status: spec.hold_status,
                    move_requirement: pipeline.moves.get(&kind).copied().unwrap_or_default(),
                }
            })
            .collect();

        let statuses = pipeline
            .statuses
            .iter()
            .map(|(status, rule)| StatusEntry {
                status: *status,
                requirement: rule.requirement,
                promotes_to: rule.promotes_to,
            })
            .collect();

        PipelineFile {
            assignees: pipeline.assignees.clone(),
            groups,
            statuses,
        }
    }
}
