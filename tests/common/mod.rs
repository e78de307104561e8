//! In-memory board server for integration tests
//!
//! Applies commands the way the real server stores them: side-data lands on the item,
//! status promotions move the item between groups, and an item whose subtasks are all
//! finished moves to "Prontos para Instalação".

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use pipeline_board::capture::{Collected, SideDataCollector};
use pipeline_board::{
    Attachment, BoardError, GroupKind, Item, ItemStatus, NewItem, PipelineDefinition, Result,
    SideData, SideDataRequirement, SubTask, SubtaskStatus, WorkflowApi, WorkflowGroup,
};

/// Group ids as the server numbers them
pub const GROUP_IDS: [(u64, GroupKind); 6] = [
    (1, GroupKind::Intake),
    (2, GroupKind::Visits),
    (3, GroupKind::Production),
    (4, GroupKind::ReadyToInstall),
    (5, GroupKind::Standby),
    (6, GroupKind::Installed),
];

pub fn group_id(kind: GroupKind) -> u64 {
    GROUP_IDS
        .iter()
        .find(|(_, k)| *k == kind)
        .map(|(id, _)| *id)
        .unwrap()
}

/// Group name as the server stores it, which for intake is the plural form
pub fn server_group_name(kind: GroupKind) -> &'static str {
    match kind {
        GroupKind::Intake => "Entrada de Orçamentos",
        other => other.display_name(),
    }
}

fn group_kind(id: u64) -> Option<GroupKind> {
    GROUP_IDS.iter().find(|(gid, _)| *gid == id).map(|(_, k)| *k)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentCommand {
    ChangeItemStatus(u64, ItemStatus, Option<SideData>),
    MoveItem(u64, u64, ItemStatus, Option<SideData>),
    ChangeSubtaskStatus(u64, SubtaskStatus),
    AddAttachment(u64, String, usize),
    AddSubtask(u64, String, String),
    CreateItem(String),
    ImportBatch(String),
}

#[derive(Default)]
struct State {
    items: BTreeMap<u64, Item>,
    next_id: u64,
    fetches: usize,
    commands: Vec<SentCommand>,
    reject_next: Option<(Option<&'static str>, u16, String)>,
    offline: bool,
}

pub struct FakeBoardServer {
    pipeline: PipelineDefinition,
    state: Mutex<State>,
}

impl FakeBoardServer {
    pub fn new() -> Self {
        Self {
            pipeline: PipelineDefinition::standard().unwrap(),
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
        }
    }

    pub fn with_item(self, item: Item) -> Self {
        self.state.lock().unwrap().items.insert(item.id, item);
        self
    }

    pub fn item(&self, id: u64) -> Item {
        self.state.lock().unwrap().items[&id].clone()
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn commands(&self) -> Vec<SentCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    /// The next command answers with this HTTP status and error message
    pub fn reject_next(&self, status: u16, message: &str) {
        self.state.lock().unwrap().reject_next = Some((None, status, message.to_string()));
    }

    /// Like `reject_next`, but only for the next command with this name
    pub fn reject_next_named(&self, command: &'static str, status: u16, message: &str) {
        self.state.lock().unwrap().reject_next = Some((Some(command), status, message.to_string()));
    }

    /// Every request fails at the transport level until switched back
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    fn execute<F>(&self, command: SentCommand, item_id: Option<u64>, apply: F) -> Result<Item>
    where
        F: FnOnce(&mut State, &PipelineDefinition) -> Result<u64>,
    {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(BoardError::NetworkFailure("connection refused".to_string()));
        }
        let name = command_name(&command);
        state.commands.push(command);

        let targeted = matches!(
            &state.reject_next,
            Some((target, ..)) if target.map_or(true, |target| target == name)
        );
        if targeted {
            if let Some((_, status, message)) = state.reject_next.take() {
                return Err(BoardError::CommandRejected {
                    command: name.to_string(),
                    status,
                    message,
                });
            }
        }
        if let Some(id) = item_id {
            if !state.items.contains_key(&id) {
                return Err(BoardError::CommandRejected {
                    command: name.to_string(),
                    status: 404,
                    message: "Orçamento não encontrado".to_string(),
                });
            }
        }

        let id = apply(&mut *state, &self.pipeline)?;
        let mut item = state.items[&id].clone();
        item.group_name = group_kind(item.group_id).map(|kind| server_group_name(kind).to_string());
        Ok(item)
    }
}

fn command_name(command: &SentCommand) -> &'static str {
    match command {
        SentCommand::ChangeItemStatus(..) => "change_item_status",
        SentCommand::MoveItem(..) => "move_item",
        SentCommand::ChangeSubtaskStatus(..) => "change_subtask_status",
        SentCommand::AddAttachment(..) => "add_attachment",
        SentCommand::AddSubtask(..) => "add_subtask",
        SentCommand::CreateItem(..) => "create_item",
        SentCommand::ImportBatch(..) => "import_batch",
    }
}

#[async_trait]
impl WorkflowApi for FakeBoardServer {
    async fn fetch_workflow(&self) -> Result<Vec<WorkflowGroup>> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(BoardError::NetworkFailure("connection refused".to_string()));
        }
        state.fetches += 1;

        Ok(GROUP_IDS
            .iter()
            .map(|(id, kind)| WorkflowGroup {
                id: *id,
                name: server_group_name(*kind).to_string(),
                items: state
                    .items
                    .values()
                    .filter(|item| item.group_id == *id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn change_item_status(
        &self,
        item_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item> {
        let command = SentCommand::ChangeItemStatus(item_id, status, side_data.clone());
        self.execute(command, Some(item_id), |state, pipeline| {
            let item = state.items.get_mut(&item_id).unwrap();
            item.status = status;
            if let Some(data) = &side_data {
                item.apply_side_data(data);
            }
            if let Some(destination) = pipeline.promotion_for(status)? {
                item.group_id = group_id(destination);
            }
            Ok(item_id)
        })
    }

    async fn move_item(
        &self,
        item_id: u64,
        group_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item> {
        let command = SentCommand::MoveItem(item_id, group_id, status, side_data.clone());
        self.execute(command, Some(item_id), |state, _| {
            let item = state.items.get_mut(&item_id).unwrap();
            item.group_id = group_id;
            item.status = status;
            if let Some(data) = &side_data {
                item.apply_side_data(data);
            }
            Ok(item_id)
        })
    }

    async fn change_subtask_status(&self, subtask_id: u64, status: SubtaskStatus) -> Result<Item> {
        let command = SentCommand::ChangeSubtaskStatus(subtask_id, status);
        self.execute(command, None, |state, _| {
            let item = state
                .items
                .values_mut()
                .find(|item| item.subtasks.iter().any(|task| task.id == subtask_id))
                .ok_or_else(|| BoardError::CommandRejected {
                    command: "change_subtask_status".to_string(),
                    status: 404,
                    message: "Tarefa não encontrada".to_string(),
                })?;

            for task in item.subtasks.iter_mut().filter(|task| task.id == subtask_id) {
                task.status = status;
            }
            if item
                .subtasks
                .iter()
                .all(|task| task.status == SubtaskStatus::Finished)
            {
                item.group_id = group_id(GroupKind::ReadyToInstall);
                item.status = ItemStatus::ProducaoFinalizada;
            }
            Ok(item.id)
        })
    }

    async fn add_attachment(
        &self,
        item_id: u64,
        filename: String,
        contents: Vec<u8>,
    ) -> Result<Item> {
        let command = SentCommand::AddAttachment(item_id, filename.clone(), contents.len());
        self.execute(command, Some(item_id), |state, _| {
            state.next_id += 1;
            let id = state.next_id;
            let item = state.items.get_mut(&item_id).unwrap();
            item.attachments.push(Attachment {
                id,
                url: format!("/uploads/{filename}"),
                filename,
            });
            Ok(item_id)
        })
    }

    async fn add_subtask(
        &self,
        item_id: u64,
        assignee: String,
        description: String,
    ) -> Result<Item> {
        let command = SentCommand::AddSubtask(item_id, assignee.clone(), description.clone());
        self.execute(command, Some(item_id), |state, _| {
            state.next_id += 1;
            let id = state.next_id;
            let item = state.items.get_mut(&item_id).unwrap();
            item.subtasks.push(SubTask {
                id,
                item_id: Some(item_id),
                assignee,
                description,
                status: SubtaskStatus::NotStarted,
            });
            Ok(item_id)
        })
    }

    async fn create_item(&self, new_item: NewItem) -> Result<Item> {
        let command = SentCommand::CreateItem(new_item.number.clone());
        self.execute(command, None, |state, _| {
            state.next_id += 1;
            let id = state.next_id;
            let mut item = Item::new(
                id,
                new_item.number,
                new_item.client,
                group_id(GroupKind::Intake),
                ItemStatus::Novo,
            );
            item.stage1_description = new_item.stage1_description;
            item.stage2_description = new_item.stage2_description;
            for production_item in new_item.selected_production_items {
                state.next_id += 1;
                item.subtasks.push(SubTask {
                    id: state.next_id,
                    item_id: Some(id),
                    assignee: production_item.assignee,
                    description: production_item.description,
                    status: SubtaskStatus::NotStarted,
                });
            }
            state.items.insert(id, item);
            Ok(id)
        })
    }

    async fn import_batch(&self, filename: String, _archive: Vec<u8>) -> Result<Item> {
        let command = SentCommand::ImportBatch(filename.clone());
        self.execute(command, None, |state, _| {
            state.next_id += 1;
            let id = state.next_id;
            let number = Path::new(&filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let item = Item::new(id, number, "Importado", group_id(GroupKind::Intake), ItemStatus::Novo);
            state.items.insert(id, item);
            Ok(id)
        })
    }
}

/// Collector that answers from a script and records what it was asked for
pub struct ScriptedCollector {
    answers: Mutex<VecDeque<Collected>>,
    asked: Mutex<Vec<SideDataRequirement>>,
}

impl ScriptedCollector {
    pub fn new(answers: Vec<Collected>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<SideDataRequirement> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl SideDataCollector for ScriptedCollector {
    async fn collect(&self, requirement: SideDataRequirement) -> Result<Collected> {
        self.asked.lock().unwrap().push(requirement);
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Collected::Cancelled))
    }
}

/// An approved order waiting in intake
pub fn approved_order(id: u64) -> Item {
    Item::new(
        id,
        format!("ORC-{id}"),
        "Marcenaria Silva",
        group_id(GroupKind::Intake),
        ItemStatus::OrcamentoAprovado,
    )
}

/// An order in production with one subtask per (id, assignee, status)
pub fn order_in_production(id: u64, tasks: &[(u64, &str, SubtaskStatus)]) -> Item {
    let mut item = Item::new(
        id,
        format!("ORC-{id}"),
        "Loja Centro",
        group_id(GroupKind::Production),
        ItemStatus::EmProducao,
    );
    item.subtasks = tasks
        .iter()
        .map(|(task_id, assignee, status)| SubTask {
            id: *task_id,
            item_id: Some(id),
            assignee: assignee.to_string(),
            description: format!("peça {task_id}"),
            status: *status,
        })
        .collect();
    item
}
