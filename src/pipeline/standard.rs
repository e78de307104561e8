// The shipped production pipeline

use super::definition::{GroupKind, ItemStatus, PipelineDefinition, SideDataRequirement};
use crate::errors::Result;

/// Collaborators who own production subtasks.
pub const DEFAULT_ASSIGNEES: [&str; 7] = [
    "Edison", "Luiz", "Hélio", "José", "Anderson", "Eudes", "Pintura",
];

impl PipelineDefinition {
    /// The standard six-stage pipeline. Validated before it is returned.
    pub fn standard() -> Result<Self> {
        use GroupKind::*;
        use ItemStatus::*;
        use SideDataRequirement as Req;

        PipelineDefinition::new()
            .with_group(
                Intake,
                1,
                &[Novo, OrcamentoAprovado, VisitaAgendada, EmEspera, ItemStatus::Standby],
                Some(EmEspera),
            )
            .with_group(
                Visits,
                2,
                &[VisitaAgendada, MedidasTiradas, EmProducao, EmEspera, ItemStatus::Standby],
                Some(EmEspera),
            )
            .with_group(
                Production,
                3,
                &[EmProducao, ProducaoFinalizada, EmEspera, ItemStatus::Standby],
                Some(EmEspera),
            )
            .with_group(
                ReadyToInstall,
                4,
                &[
                    ProducaoFinalizada,
                    AguardandoInstalacao,
                    InstalacaoAgendada,
                    Instalado,
                    EmEspera,
                    ItemStatus::Standby,
                ],
                Some(EmEspera),
            )
            .with_group(
                GroupKind::Standby,
                5,
                &[ItemStatus::Standby, OrcamentoAprovado],
                Some(ItemStatus::Standby),
            )
            .with_group(Installed, 6, &[Instalado], None)
            .with_status(Novo, Req::None, None)
            .with_status(OrcamentoAprovado, Req::None, Some(Intake))
            .with_status(VisitaAgendada, Req::VisitScheduling, Some(Visits))
            .with_status(MedidasTiradas, Req::None, None)
            .with_status(EmProducao, Req::ProductionDateRange, Some(Production))
            .with_status(ProducaoFinalizada, Req::None, Some(ReadyToInstall))
            .with_status(AguardandoInstalacao, Req::None, None)
            .with_status(InstalacaoAgendada, Req::InstallationScheduling, None)
            .with_status(Instalado, Req::InstalledPhaseSelection, Some(Installed))
            .with_status(EmEspera, Req::None, None)
            .with_status(ItemStatus::Standby, Req::None, Some(GroupKind::Standby))
            .with_move(Intake, Req::None)
            .with_move(Visits, Req::VisitScheduling)
            .with_move(Production, Req::ProductionDateRange)
            .with_move(ReadyToInstall, Req::None)
            .with_move(GroupKind::Standby, Req::None)
            .with_move(Installed, Req::InstalledPhaseSelection)
            .with_assignees(DEFAULT_ASSIGNEES)
            .validated()
    }
}
