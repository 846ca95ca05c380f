// In-process result store. Lives as long as the process; nothing is evicted.

use super::{ResultStore, StoreResult};
use crate::models::AnalysisRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, AnalysisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn put(&self, record: &AnalysisRecord) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<AnalysisRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_result_id;
    use chrono::Utc;
    use serde_json::json;

    fn record(idea: &str) -> AnalysisRecord {
        AnalysisRecord {
            id: new_result_id(),
            idea: idea.to_string(),
            skill_level: "beginner".to_string(),
            market: json!({"saturation_score": 4}),
            technical: json!({"difficulty": "beginner"}),
            opportunity: json!({}),
            deployment: json!({}),
            sentiment: json!({"parseError": true, "raw": "??"}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        let rec = record("plants");
        store.put(&rec).await.unwrap();

        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        assert!(store.get("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_are_independent() {
        let store = MemoryStore::new();
        let a = record("a");
        let b = record("b");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        assert_eq!(store.get(&a.id).await.unwrap().unwrap().idea, "a");
        assert_eq!(store.get(&b.id).await.unwrap().unwrap().idea, "b");
    }
}
