use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::errors::{BoardError, Result};
use crate::models::SideData;
use crate::pipeline::SideDataRequirement;

/// Result of a side-data collection. Cancelling is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Payload(SideData),
    Cancelled,
}

/// Obtains side-data from the user. Suspends until the user confirms or cancels;
/// there is no timeout.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait SideDataCollector: Send + Sync {
    async fn collect(&self, requirement: SideDataRequirement) -> Result<Collected>;
}

/// Check a payload against the requirement it was collected for
pub fn ensure_matches(requirement: SideDataRequirement, collected: &Collected) -> Result<()> {
    match collected {
        Collected::Payload(data) if data.requirement() != requirement => {
            Err(BoardError::InvalidSideData(format!(
                "expected {requirement}, got {}",
                data.requirement()
            )))
        }
        _ => Ok(()),
    }
}

/// A pending collection handed to whatever drives the user interface
#[derive(Debug)]
pub struct CaptureRequest {
    pub requirement: SideDataRequirement,
    pub reply: oneshot::Sender<Collected>,
}

impl CaptureRequest {
    pub fn respond(self, collected: Collected) {
        if self.reply.send(collected).is_err() {
            debug!(requirement = %self.requirement, "Capture requester went away");
        }
    }

    pub fn cancel(self) {
        self.respond(Collected::Cancelled);
    }
}

/// Forwards each collection over a channel and waits for the reply.
/// A dropped reply or a closed channel counts as cancellation.
#[derive(Debug, Clone)]
pub struct ChannelCollector {
    requests: mpsc::Sender<CaptureRequest>,
}

impl ChannelCollector {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<CaptureRequest>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl SideDataCollector for ChannelCollector {
    async fn collect(&self, requirement: SideDataRequirement) -> Result<Collected> {
        let (reply, answer) = oneshot::channel();

        if self
            .requests
            .send(CaptureRequest { requirement, reply })
            .await
            .is_err()
        {
            warn!(%requirement, "No capture front-end is listening; treating as cancelled");
            return Ok(Collected::Cancelled);
        }

        let collected = answer.await.unwrap_or(Collected::Cancelled);
        ensure_matches(requirement, &collected)?;
        Ok(collected)
    }
}
