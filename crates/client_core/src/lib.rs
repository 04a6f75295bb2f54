use std::{sync::Arc, time::Duration};

use shared::error::EvaluationError;
use tracing::info;

pub mod backend;
pub mod channel;
pub mod dataset;
pub mod orchestrator;
pub mod params;

pub use backend::{EvaluationBackend, HttpEvaluationClient, MissingEvaluationBackend};
pub use channel::{DatasetStatus, ReplayChannel, Snapshot};
pub use dataset::{DatasetKind, Page};
pub use orchestrator::{DashboardChannels, FetchOutcome, Orchestrator, RefreshHandle};
pub use params::{ParameterChange, ParameterSnapshot, ParameterStore};

/// Everything a presentation surface needs, built once at startup and passed
/// around by reference.
pub struct DashboardContext {
    orchestrator: Arc<Orchestrator>,
}

impl DashboardContext {
    pub fn new(backend: Arc<dyn EvaluationBackend>, initial: ParameterSnapshot) -> Self {
        Self {
            orchestrator: Orchestrator::new(backend, initial),
        }
    }

    pub fn connect(
        base_url: &str,
        timeout: Duration,
        initial: ParameterSnapshot,
    ) -> Result<Self, EvaluationError> {
        let client = HttpEvaluationClient::with_timeout(base_url, timeout)?;
        info!(base_url = %client.base_url(), ?timeout, "backend: client ready");
        Ok(Self::new(Arc::new(client), initial))
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn channels(&self) -> &DashboardChannels {
        self.orchestrator.channels()
    }

    /// Initial load of every dataset for the configured selection.
    pub async fn start(&self) -> RefreshHandle {
        self.orchestrator.refresh_all().await
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod backend_tests;
