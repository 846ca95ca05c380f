//! Server application state shared across handlers

use crate::analysis::AnalysisOrchestrator;
use crate::config::AppConfig;
use crate::llm::PerplexityClient;
use crate::shutdown::ShutdownState;
use crate::store::{build_store, ResultStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct ServerAppState {
    /// Runs analysis pipelines; writes into `store`
    pub orchestrator: Arc<AnalysisOrchestrator>,

    /// Read side of the result store
    pub store: Arc<dyn ResultStore>,

    /// Shutdown state and in-flight run tracking
    pub shutdown_state: ShutdownState,
}

impl ServerAppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        store: Arc<dyn ResultStore>,
        shutdown_state: ShutdownState,
    ) -> Self {
        Self {
            orchestrator,
            store,
            shutdown_state,
        }
    }

    /// Wire the real completion client and the configured store backend
    pub fn from_config(config: &AppConfig, shutdown_state: ShutdownState) -> Self {
        let client = Arc::new(PerplexityClient::new(
            config.api_key.clone(),
            config.api_url.clone(),
            config.model.clone(),
            config.upstream_timeout_secs,
        ));
        let model = client.model().to_string();

        let store = build_store(config);
        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            client,
            store.clone(),
            config.extraction_policy,
        ));
        log::info!(
            "Completion model '{}' (timeout {}s, {} extraction policy)",
            model,
            config.upstream_timeout_secs,
            orchestrator.policy().as_str()
        );

        Self::new(orchestrator, store, shutdown_state)
    }
}
