//! Result store for completed analyses
//!
//! One trait, two backends. The backend is chosen once at startup by
//! [`build_store`] and injected into the orchestrator and the HTTP layer.

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use crate::config::AppConfig;
use crate::models::AnalysisRecord;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage request failed: {0}")]
    Request(String),

    #[error("Storage request timed out after {0}s")]
    Timeout(u64),

    #[error("Storage service error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Stored record could not be decoded: {0}")]
    Decode(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a completed record under its own id
    async fn put(&self, record: &AnalysisRecord) -> StoreResult<()>;

    /// Look up a record; `Ok(None)` when the id is unknown
    async fn get(&self, id: &str) -> StoreResult<Option<AnalysisRecord>>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Pick the durable backend when it is fully configured, otherwise the in-memory one
pub fn build_store(config: &AppConfig) -> Arc<dyn ResultStore> {
    match &config.storage {
        Some(storage) => {
            log::info!(
                "Using durable result store at {} (table '{}')",
                storage.url,
                storage.table
            );
            Arc::new(SupabaseStore::new(
                storage.url.clone(),
                storage.key.clone(),
                storage.table.clone(),
                config.upstream_timeout_secs,
            ))
        }
        None => {
            log::warn!(
                "SUPABASE_URL/SUPABASE_KEY not set; results are kept in memory and lost on restart"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
