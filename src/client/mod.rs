//! Compliance service client: run status and results retrieval.

pub mod http;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::archive::PipeReader;

pub use http::HttpComplianceClient;

/// Run status reported once every plugin has finished and results are ready.
pub const COMPLETE_STATUS: &str = "complete";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid compliance endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("compliance service returned {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Aggregate status of a compliance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: String,
    #[serde(default)]
    pub plugins: Vec<PluginStatus>,
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        self.status == COMPLETE_STATUS
    }
}

/// Status of one plugin on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginStatus {
    pub plugin: String,
    pub node: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct RetrieveConfig {
    pub namespace: String,
}

/// A results archive being streamed from the service.
///
/// `reader` yields the outer tar stream. `errors` carries a transport
/// failure if one happens; it closes without a value once the download
/// finished cleanly.
#[derive(Debug)]
pub struct Retrieval {
    pub reader: PipeReader,
    pub errors: oneshot::Receiver<anyhow::Error>,
}

/// Trait for compliance service backends.
#[async_trait::async_trait]
pub trait ComplianceClient: Send + Sync {
    /// Fetch the current run status in `namespace`.
    async fn status(&self, namespace: &str) -> Result<RunStatus>;

    /// Start streaming the results archive. Must be called from within a
    /// Tokio runtime.
    fn retrieve_results(&self, config: &RetrieveConfig) -> Retrieval;
}
