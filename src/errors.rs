// Error taxonomy for the board client
// Server and transport failures are never fatal to the session: the caller shows them
// and the reconciliation loop re-synchronizes from the server.

use thiserror::Error;

use crate::pipeline::{GroupKind, ItemStatus};

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Status '{status}' is not legal in group '{group}'")]
    InvalidStatus { status: ItemStatus, group: GroupKind },

    #[error("Server rejected {command} (HTTP {status}): {message}")]
    CommandRejected {
        command: String,
        status: u16,
        message: String,
    },

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Item {0} is not on the board")]
    UnknownItem(u64),

    #[error("Subtask {0} is not on the board")]
    UnknownSubtask(u64),

    #[error("Group '{0}' is not on the board")]
    UnknownGroup(String),

    #[error("Unknown status '{0}'")]
    UnknownStatus(String),

    #[error("Assignee '{0}' is not on the production roster")]
    UnknownAssignee(String),

    #[error("Invalid side-data: {0}")]
    InvalidSideData(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BoardError {
    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            BoardError::InvalidStatus { .. } => "INVALID_STATUS",
            BoardError::CommandRejected { .. } => "COMMAND_REJECTED",
            BoardError::NetworkFailure(_) => "NETWORK_FAILURE",
            BoardError::UnknownItem(_) => "UNKNOWN_ITEM",
            BoardError::UnknownSubtask(_) => "UNKNOWN_SUBTASK",
            BoardError::UnknownGroup(_) => "UNKNOWN_GROUP",
            BoardError::UnknownStatus(_) => "UNKNOWN_STATUS",
            BoardError::UnknownAssignee(_) => "UNKNOWN_ASSIGNEE",
            BoardError::InvalidSideData(_) => "INVALID_SIDE_DATA",
            BoardError::InvalidArchive(_) => "INVALID_ARCHIVE",
            BoardError::Config(_) => "CONFIG_ERROR",
            BoardError::Io(_) => "IO_ERROR",
        }
    }

    /// Errors reported by the server or the transport. These are the ones that are
    /// followed by a forced reconciliation.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BoardError::CommandRejected { .. } | BoardError::NetworkFailure(_)
        )
    }

    /// Only a broken configuration ends the session; everything else is shown to the
    /// user who may re-initiate the action.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, BoardError::Config(_))
    }
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::NetworkFailure(err.to_string())
    }
}

/// Convert an error to an appropriate exit code
pub fn to_exit_code(error: &BoardError) -> i32 {
    match error {
        BoardError::Config(_) => 78,
        BoardError::NetworkFailure(_) => 69,
        _ => 1,
    }
}
