use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::WorkflowApi;
use crate::config::ServerConfig;
use crate::errors::{BoardError, Result};
use crate::models::{Item, NewItem, SideData, SubtaskStatus, WorkflowGroup};
use crate::pipeline::ItemStatus;

/// Rate-limited HTTP client for the board server
#[derive(Debug, Clone)]
pub struct HttpWorkflowApi {
    client: Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    status: &'a str,
    #[serde(rename = "dados", skip_serializing_if = "Option::is_none")]
    side_data: Option<&'a SideData>,
}

#[derive(Debug, Serialize)]
struct MoveBody<'a> {
    #[serde(rename = "novo_grupo_id")]
    group_id: u64,
    status: &'a str,
    #[serde(rename = "dados", skip_serializing_if = "Option::is_none")]
    side_data: Option<&'a SideData>,
}

#[derive(Debug, Serialize)]
struct SubtaskStatusBody<'a> {
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct NewSubtaskBody<'a> {
    #[serde(rename = "colaborador")]
    assignee: &'a str,
    #[serde(rename = "item_descricao")]
    description: &'a str,
}

impl HttpWorkflowApi {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            BoardError::Config("server.requests_per_second must be positive".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BoardError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and decode the answer.
    ///
    /// Non-2xx answers become `CommandRejected` carrying the server's `error` message;
    /// transport failures and undecodable bodies become `NetworkFailure`.
    async fn send<T: DeserializeOwned>(&self, command: &str, request: RequestBuilder) -> Result<T> {
        self.rate_limiter.until_ready().await;
        debug!(command, "Sending board request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) if body.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                Err(_) => body.trim().to_string(),
            };
            warn!(command, status = status.as_u16(), %message, "Server rejected request");
            return Err(BoardError::CommandRejected {
                command: command.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            BoardError::NetworkFailure(format!("{command}: undecodable response: {e}"))
        })
    }

    fn file_form(filename: String, contents: Vec<u8>) -> Form {
        Form::new().part("file", Part::bytes(contents).file_name(filename))
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn fetch_workflow(&self) -> Result<Vec<WorkflowGroup>> {
        let request = self.client.get(self.url("/api/workflow"));
        self.send("fetch_workflow", request).await
    }

    async fn change_item_status(
        &self,
        item_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item> {
        let body = StatusBody {
            status: status.as_str(),
            side_data: side_data.as_ref(),
        };
        let request = self
            .client
            .put(self.url(&format!("/api/orcamento/{item_id}/status")))
            .json(&body);
        self.send("change_item_status", request).await
    }

    async fn move_item(
        &self,
        item_id: u64,
        group_id: u64,
        status: ItemStatus,
        side_data: Option<SideData>,
    ) -> Result<Item> {
        let body = MoveBody {
            group_id,
            status: status.as_str(),
            side_data: side_data.as_ref(),
        };
        let request = self
            .client
            .put(self.url(&format!("/api/orcamento/{item_id}/move")))
            .json(&body);
        self.send("move_item", request).await
    }

    async fn change_subtask_status(&self, subtask_id: u64, status: SubtaskStatus) -> Result<Item> {
        let request = self
            .client
            .put(self.url(&format!("/api/tarefa/{subtask_id}/status")))
            .json(&SubtaskStatusBody {
                status: status.as_str(),
            });
        self.send("change_subtask_status", request).await
    }

    async fn add_attachment(
        &self,
        item_id: u64,
        filename: String,
        contents: Vec<u8>,
    ) -> Result<Item> {
        let request = self
            .client
            .post(self.url(&format!("/api/orcamento/{item_id}/add_file")))
            .multipart(Self::file_form(filename, contents));
        self.send("add_attachment", request).await
    }

    async fn add_subtask(
        &self,
        item_id: u64,
        assignee: String,
        description: String,
    ) -> Result<Item> {
        let request = self
            .client
            .post(self.url(&format!("/api/orcamento/{item_id}/tarefas")))
            .json(&NewSubtaskBody {
                assignee: &assignee,
                description: &description,
            });
        self.send("add_subtask", request).await
    }

    async fn create_item(&self, item: NewItem) -> Result<Item> {
        let request = self.client.post(self.url("/api/orcamento")).json(&item);
        self.send("create_item", request).await
    }

    async fn import_batch(&self, filename: String, archive: Vec<u8>) -> Result<Item> {
        let request = self
            .client
            .post(self.url("/api/upload"))
            .multipart(Self::file_form(filename, archive));
        self.send("import_batch", request).await
    }
}
