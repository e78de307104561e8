// Persistence collaborator contract
//
// Every call is client-initiated request/response; there is no push channel. Every
// mutation answers with the (parent) item as the server now stores it.

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::errors::Result;
use crate::models::{Item, NewItem, SideData, SubtaskStatus, WorkflowGroup};
use crate::pipeline::ItemStatus;

/// Trait for board server operations to enable testing with mocks
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Full authoritative board, groups in pipeline order.
    async fn fetch_workflow(&self) -> Result<Vec<WorkflowGroup>>;

    async fn change_item_status(
        &self,
        item_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item>;

    /// `status` is the status the item holds in the destination group.
    async fn move_item(
        &self,
        item_id: u64,
        group_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item>;

    /// Answers with the parent item, including its subtasks and current group.
    async fn change_subtask_status(&self, subtask_id: u64, status: SubtaskStatus) -> Result<Item>;

    async fn add_attachment(&self, item_id: u64, filename: String, contents: Vec<u8>)
        -> Result<Item>;

    async fn add_subtask(&self, item_id: u64, assignee: String, description: String)
        -> Result<Item>;

    async fn create_item(&self, item: NewItem) -> Result<Item>;

    /// Uploads a batch archive; the server ingests it and answers with the created item.
    async fn import_batch(&self, filename: String, archive: Vec<u8>) -> Result<Item>;
}
