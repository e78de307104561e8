//! End-to-end board scenarios against an in-memory server
//!
//! Each test drives a BoardSession the way the CLI does and checks both what was sent
//! and what the board shows after the reload that follows every command.

mod common;

use chrono::NaiveDate;
use std::sync::Arc;

use common::{approved_order, order_in_production, FakeBoardServer, ScriptedCollector, SentCommand};
use pipeline_board::capture::due_date_for;
use pipeline_board::{
    BoardError, BoardSession, ChannelCollector, Collected, GroupKind, ItemStatus, NewItem,
    PipelineDefinition, ProductionItem, SideData, SideDataRequirement, SubtaskStatus,
    TransitionOutcome,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn pipeline() -> Arc<PipelineDefinition> {
    Arc::new(PipelineDefinition::standard().unwrap())
}

async fn scripted_session(
    server: FakeBoardServer,
    answers: Vec<Collected>,
) -> (
    Arc<FakeBoardServer>,
    Arc<ScriptedCollector>,
    BoardSession<FakeBoardServer, ScriptedCollector>,
) {
    let server = Arc::new(server);
    let collector = Arc::new(ScriptedCollector::new(answers));
    let session = BoardSession::new(Arc::clone(&server), Arc::clone(&collector), pipeline());
    session.refresh().await.unwrap();
    (server, collector, session)
}

#[tokio::test]
async fn test_scheduling_a_visit_moves_the_order_to_visits() {
    let server = Arc::new(FakeBoardServer::new().with_item(approved_order(10)));
    let (collector, mut requests) = ChannelCollector::new(1);
    let session = BoardSession::new(Arc::clone(&server), Arc::new(collector), pipeline());
    session.refresh().await.unwrap();

    let front_end = tokio::spawn(async move {
        let request = requests.recv().await.unwrap();
        assert_eq!(request.requirement, SideDataRequirement::VisitScheduling);
        request.respond(Collected::Payload(SideData::Visit {
            date: date(2024, 5, 1),
            responsible: "Ana".to_string(),
        }));
    });

    let outcome = session
        .change_status(10, ItemStatus::VisitaAgendada)
        .await
        .unwrap();
    front_end.await.unwrap();

    let TransitionOutcome::Applied(item) = outcome else {
        panic!("expected the status change to be applied");
    };
    assert_eq!(item.status, ItemStatus::VisitaAgendada);

    let snapshot = session.snapshot();
    let (group, stored) = snapshot.item_with_group(10).unwrap();
    assert_eq!(group.kind, GroupKind::Visits);
    assert_eq!(stored.visit_date, Some(date(2024, 5, 1)));
    assert_eq!(stored.visit_responsible.as_deref(), Some("Ana"));
    assert_eq!(server.fetches(), 2);
}

#[tokio::test]
async fn test_cancelled_capture_sends_nothing_and_still_reloads() {
    let (server, collector, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![Collected::Cancelled]).await;

    let outcome = session
        .change_status(10, ItemStatus::VisitaAgendada)
        .await
        .unwrap();

    assert_eq!(outcome, TransitionOutcome::Cancelled);
    assert_eq!(collector.asked(), vec![SideDataRequirement::VisitScheduling]);
    assert!(server.commands().is_empty());
    assert_eq!(server.fetches(), 2);

    let snapshot = session.snapshot();
    let (group, item) = snapshot.item_with_group(10).unwrap();
    assert_eq!(group.kind, GroupKind::Intake);
    assert_eq!(item.status, ItemStatus::OrcamentoAprovado);
    assert_eq!(item.visit_date, None);
}

#[tokio::test]
async fn test_status_outside_group_vocabulary_is_refused_locally() {
    let (server, collector, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;

    let err = session
        .change_status(10, ItemStatus::Instalado)
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::InvalidStatus { .. }));
    assert!(collector.asked().is_empty());
    assert!(server.commands().is_empty());
    assert_eq!(server.fetches(), 1);
}

#[tokio::test]
async fn test_rejected_command_surfaces_message_and_reloads_once() {
    let (server, _, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;
    server.reject_next(400, "Status inválido para o grupo");

    let err = session.change_status(10, ItemStatus::Novo).await.unwrap_err();

    match err {
        BoardError::CommandRejected {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Status inválido para o grupo");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(server.fetches(), 2);
    assert_eq!(server.item(10).status, ItemStatus::OrcamentoAprovado);
}

#[tokio::test]
async fn test_network_failure_keeps_last_snapshot() {
    let (server, _, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;
    let before = session.snapshot();
    server.set_offline(true);

    let err = session.change_status(10, ItemStatus::Novo).await.unwrap_err();

    assert!(matches!(err, BoardError::NetworkFailure(_)));
    let after = session.snapshot();
    assert_eq!(after.revision(), before.revision());
    assert_eq!(after.item(10).unwrap().status, ItemStatus::OrcamentoAprovado);
    assert_eq!(session.metrics().get_stats().network_failures, 1);
}

#[tokio::test]
async fn test_every_mutation_reloads_exactly_once() {
    let (server, _, session) = scripted_session(
        FakeBoardServer::new().with_item(order_in_production(20, &[(201, "Edison", SubtaskStatus::NotStarted)])),
        vec![],
    )
    .await;

    session.change_subtask_status(201, SubtaskStatus::Started).await.unwrap();
    assert_eq!(server.fetches(), 2);

    session.add_subtask(20, "luiz", "Gavetas").await.unwrap();
    assert_eq!(server.fetches(), 3);

    server.reject_next(500, "erro interno");
    assert!(session.add_subtask(20, "Luiz", "Tampos").await.is_err());
    assert_eq!(server.fetches(), 4);

    let mut watcher = session.subscribe();
    session.change_status(20, ItemStatus::EmEspera).await.unwrap();
    assert_eq!(server.fetches(), 5);
    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().revision(), 5);
}

#[tokio::test]
async fn test_subtask_on_hold_forces_parent_into_hold() {
    let (server, _, session) = scripted_session(
        FakeBoardServer::new().with_item(order_in_production(
            20,
            &[
                (201, "Edison", SubtaskStatus::Started),
                (202, "Luiz", SubtaskStatus::NotStarted),
            ],
        )),
        vec![],
    )
    .await;

    let outcome = session
        .change_subtask_status(201, SubtaskStatus::Hold)
        .await
        .unwrap();

    let forced = outcome.forced.expect("hold should be propagated");
    assert_eq!(forced.from, ItemStatus::EmProducao);
    assert_eq!(forced.to, ItemStatus::EmEspera);
    assert_eq!(outcome.forced_item.unwrap().status, ItemStatus::EmEspera);
    assert!(outcome.forced_error.is_none());
    assert_eq!(outcome.promoted_to, None);

    assert_eq!(
        server.commands(),
        vec![
            SentCommand::ChangeSubtaskStatus(201, SubtaskStatus::Hold),
            SentCommand::ChangeItemStatus(20, ItemStatus::EmEspera, None),
        ]
    );
    // one reload per command
    assert_eq!(server.fetches(), 3);
    assert_eq!(session.snapshot().item(20).unwrap().status, ItemStatus::EmEspera);
}

#[tokio::test]
async fn test_rejected_forced_hold_leaves_subtask_change_standing() {
    let (server, _, session) = scripted_session(
        FakeBoardServer::new().with_item(order_in_production(20, &[(201, "Edison", SubtaskStatus::Started)])),
        vec![],
    )
    .await;
    server.reject_next_named("change_item_status", 409, "Orçamento bloqueado");

    let outcome = session
        .change_subtask_status(201, SubtaskStatus::Hold)
        .await
        .unwrap();

    assert!(outcome.forced.is_some());
    assert!(outcome.forced_item.is_none());
    assert!(matches!(
        outcome.forced_error,
        Some(BoardError::CommandRejected { status: 409, .. })
    ));

    let snapshot = session.snapshot();
    let (item, task) = snapshot.subtask(201).unwrap();
    assert_eq!(task.status, SubtaskStatus::Hold);
    assert_eq!(item.status, ItemStatus::EmProducao);
    assert_eq!(server.fetches(), 3);
}

#[tokio::test]
async fn test_last_subtask_finished_promotes_order() {
    let (_, _, session) = scripted_session(
        FakeBoardServer::new().with_item(order_in_production(
            30,
            &[
                (301, "Edison", SubtaskStatus::Finished),
                (302, "Pintura", SubtaskStatus::Finishing),
            ],
        )),
        vec![],
    )
    .await;

    let outcome = session
        .change_subtask_status(302, SubtaskStatus::Finished)
        .await
        .unwrap();

    assert_eq!(outcome.promoted_to, Some(GroupKind::ReadyToInstall));
    assert!(outcome.forced.is_none());
    let snapshot = session.snapshot();
    let (group, item) = snapshot.item_with_group(30).unwrap();
    assert_eq!(group.kind, GroupKind::ReadyToInstall);
    assert_eq!(item.status, ItemStatus::ProducaoFinalizada);
}

#[tokio::test]
async fn test_move_into_production_collects_date_range() {
    let entry = date(2024, 6, 3);
    let due = due_date_for(entry, 30).unwrap();
    let (server, collector, session) = scripted_session(
        FakeBoardServer::new().with_item(approved_order(10)),
        vec![Collected::Payload(SideData::ProductionRange {
            entry_date: entry,
            due_date: due,
        })],
    )
    .await;

    let outcome = session.move_item(10, GroupKind::Production).await.unwrap();

    assert!(matches!(outcome, TransitionOutcome::Applied(_)));
    assert_eq!(collector.asked(), vec![SideDataRequirement::ProductionDateRange]);
    assert_eq!(
        server.commands(),
        vec![SentCommand::MoveItem(
            10,
            common::group_id(GroupKind::Production),
            ItemStatus::EmProducao,
            Some(SideData::ProductionRange {
                entry_date: entry,
                due_date: due,
            }),
        )]
    );
    let stored = server.item(10);
    assert_eq!(stored.production_entry_date, Some(entry));
    assert_eq!(stored.production_due_date, Some(date(2024, 7, 3)));
}

#[tokio::test]
async fn test_mismatched_payload_is_refused_before_sending() {
    let (server, _, session) = scripted_session(
        FakeBoardServer::new().with_item(approved_order(10)),
        vec![Collected::Payload(SideData::Installation {
            date: date(2024, 5, 1),
            responsible: "Ana".to_string(),
        })],
    )
    .await;

    let err = session
        .change_status(10, ItemStatus::VisitaAgendada)
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::InvalidSideData(_)));
    assert!(server.commands().is_empty());
    // the aborted capture still reloads the board
    assert_eq!(server.fetches(), 2);
    assert_eq!(session.snapshot().item(10).unwrap().status, ItemStatus::OrcamentoAprovado);
}

#[tokio::test]
async fn test_attachment_upload_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planta.pdf");
    std::fs::write(&path, b"%PDF-1.4 fake").unwrap();

    let (server, _, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;

    let item = session.add_attachment(10, &path).await.unwrap();

    assert_eq!(item.attachments.len(), 1);
    assert_eq!(item.attachments[0].filename, "planta.pdf");
    assert_eq!(
        server.commands(),
        vec![SentCommand::AddAttachment(10, "planta.pdf".to_string(), 13)]
    );
    assert_eq!(session.snapshot().item(10).unwrap().attachments.len(), 1);
}

#[tokio::test]
async fn test_missing_attachment_file_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;

    let err = session
        .add_attachment(10, &dir.path().join("nao-existe.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::Io(_)));
    assert!(server.commands().is_empty());
}

#[tokio::test]
async fn test_batch_import_requires_zip_archive() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("lote.csv");
    let zip = dir.path().join("ORC-77.zip");
    std::fs::write(&csv, b"numero,cliente").unwrap();
    std::fs::write(&zip, b"PK\x03\x04").unwrap();

    let (server, _, session) = scripted_session(FakeBoardServer::new(), vec![]).await;

    let err = session.import_batch(&csv).await.unwrap_err();
    assert!(matches!(err, BoardError::InvalidArchive(_)));
    assert!(server.commands().is_empty());

    let item = session.import_batch(&zip).await.unwrap();
    assert_eq!(item.number, "ORC-77");
    assert_eq!(server.commands(), vec![SentCommand::ImportBatch("ORC-77.zip".to_string())]);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.group(GroupKind::Intake).unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_create_item_uses_roster_spelling() {
    let (server, _, session) = scripted_session(FakeBoardServer::new(), vec![]).await;

    let item = session
        .create_item(NewItem {
            number: "ORC-9".to_string(),
            client: "Casa Verde".to_string(),
            stage1_description: Some("Cozinha".to_string()),
            stage2_description: None,
            selected_production_items: vec![
                "hélio=Portas".parse::<ProductionItem>().unwrap(),
                "PINTURA=Laca".parse::<ProductionItem>().unwrap(),
            ],
        })
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    let assignees: Vec<&str> = item.subtasks.iter().map(|t| t.assignee.as_str()).collect();
    assert_eq!(assignees, vec!["Hélio", "Pintura"]);
    assert_eq!(server.fetches(), 2);
    assert_eq!(session.snapshot().item_count(), 1);
}

#[tokio::test]
async fn test_unknown_assignee_is_refused_locally() {
    let (server, _, session) =
        scripted_session(FakeBoardServer::new().with_item(approved_order(10)), vec![]).await;

    let err = session.add_subtask(10, "Maria", "Tampos").await.unwrap_err();

    assert!(matches!(err, BoardError::UnknownAssignee(_)));
    assert!(server.commands().is_empty());
}
