// Durable result store backed by a Supabase (PostgREST) table

use super::{ResultStore, StoreError, StoreResult};
use crate::models::AnalysisRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Row layout of the analyses table. Columns are snake_case; callers only
/// ever see [`AnalysisRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnalysisRow {
    id: String,
    idea: String,
    #[serde(default)]
    skill_level: Option<String>,
    #[serde(default)]
    market: Value,
    #[serde(default)]
    technical: Value,
    #[serde(default)]
    opportunity: Value,
    #[serde(default)]
    deployment: Value,
    #[serde(default)]
    sentiment: Value,
    created_at: DateTime<Utc>,
}

impl From<&AnalysisRecord> for AnalysisRow {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            id: record.id.clone(),
            idea: record.idea.clone(),
            skill_level: Some(record.skill_level.clone()),
            market: record.market.clone(),
            technical: record.technical.clone(),
            opportunity: record.opportunity.clone(),
            deployment: record.deployment.clone(),
            sentiment: record.sentiment.clone(),
            created_at: record.created_at,
        }
    }
}

impl From<AnalysisRow> for AnalysisRecord {
    fn from(row: AnalysisRow) -> Self {
        Self {
            id: row.id,
            idea: row.idea,
            skill_level: row
                .skill_level
                .unwrap_or_else(|| crate::models::DEFAULT_SKILL_LEVEL.to_string()),
            market: row.market,
            technical: row.technical,
            opportunity: row.opportunity,
            deployment: row.deployment,
            sentiment: row.sentiment,
            created_at: row.created_at,
        }
    }
}

pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    key: String,
    table: String,
    timeout_secs: u64,
}

impl SupabaseStore {
    pub fn new(base_url: String, key: String, table: String, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build storage HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            table,
            timeout_secs,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout_secs)
        } else {
            StoreError::Request(e.to_string())
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

async fn ensure_success(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Service { status, body })
}

#[async_trait]
impl ResultStore for SupabaseStore {
    async fn put(&self, record: &AnalysisRecord) -> StoreResult<()> {
        let row = AnalysisRow::from(record);
        let response = self
            .request(reqwest::Method::POST, &self.table_url())
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<AnalysisRecord>> {
        // Ids are always uuids; anything else cannot match a row
        if uuid::Uuid::parse_str(id).is_err() {
            return Ok(None);
        }

        let filter = format!("eq.{}", id);
        let response = self
            .request(reqwest::Method::GET, &self.table_url())
            .query(&[("id", filter.as_str()), ("select", "*"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = ensure_success(response).await?;

        let rows: Vec<AnalysisRow> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else {
                StoreError::Decode(e.to_string())
            }
        })?;
        Ok(rows.into_iter().next().map(AnalysisRecord::from))
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Rows = Arc<Mutex<Vec<Value>>>;

    async fn list_rows(
        State(rows): State<Rows>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Vec<Value>> {
        let wanted = params
            .get("id")
            .and_then(|f| f.strip_prefix("eq."))
            .unwrap_or_default()
            .to_string();
        let rows = rows.lock().unwrap();
        Json(
            rows.iter()
                .filter(|r| r["id"] == wanted.as_str())
                .cloned()
                .collect(),
        )
    }

    async fn insert_row(
        State(rows): State<Rows>,
        headers: HeaderMap,
        Json(row): Json<Value>,
    ) -> StatusCode {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("service-key") {
            return StatusCode::UNAUTHORIZED;
        }
        rows.lock().unwrap().push(row);
        StatusCode::CREATED
    }

    async fn spawn_stub(rows: Rows) -> String {
        let app = Router::new()
            .route("/rest/v1/analyses", get(list_rows).post(insert_row))
            .with_state(rows);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn store_at(url: String, key: &str) -> SupabaseStore {
        SupabaseStore::new(url, key.to_string(), "analyses".to_string(), 5)
    }

    fn record() -> AnalysisRecord {
        AnalysisRecord {
            id: crate::models::new_result_id(),
            idea: "A mobile app that tracks houseplant watering schedules".to_string(),
            skill_level: "beginner".to_string(),
            market: json!({"saturation_score": 6}),
            technical: json!({"difficulty": "beginner"}),
            opportunity: json!({"opportunity_grade": "B"}),
            deployment: json!({"primary_recommendation": "mobile_cross_platform"}),
            sentiment: json!({"insights": []}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_writes_snake_case_row_and_get_maps_back() {
        let rows: Rows = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_stub(rows.clone()).await;
        let store = store_at(url, "service-key");

        let rec = record();
        store.put(&rec).await.unwrap();

        {
            let stored = rows.lock().unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0]["skill_level"], "beginner");
            assert!(stored[0].get("skillLevel").is_none());
        }

        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded, rec);
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let rows: Rows = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_stub(rows).await;
        let store = store_at(url, "service-key");

        assert!(store.get("does-not-exist").await.unwrap().is_none());
        assert!(store
            .get(&crate::models::new_result_id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_non_uuid_id_skips_the_request() {
        // Nothing listens here, so any request would fail
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let store = store_at(format!("http://{}", addr), "service-key");

        assert!(store.get("does-not-exist").await.unwrap().is_none());
        assert!(matches!(
            store.get(&crate::models::new_result_id()).await,
            Err(StoreError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_stalled_insert_times_out() {
        let app = Router::new().route(
            "/rest/v1/analyses",
            axum::routing::post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                StatusCode::CREATED
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let store = SupabaseStore::new(
            format!("http://{}", addr),
            "service-key".to_string(),
            "analyses".to_string(),
            1,
        );

        let result =
            tokio::time::timeout(std::time::Duration::from_secs(30), store.put(&record())).await;
        let err = result.expect("put should give up on its own").unwrap_err();
        assert!(matches!(err, StoreError::Timeout(1)));
        assert_eq!(err.to_string(), "Storage request timed out after 1s");
    }

    #[tokio::test]
    async fn test_rejected_insert_is_service_error() {
        let rows: Rows = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_stub(rows.clone()).await;
        let store = store_at(url, "wrong-key");

        let err = store.put(&record()).await.unwrap_err();
        assert!(matches!(err, StoreError::Service { status: 401, .. }));
        assert!(rows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_row_without_skill_level_uses_default() {
        let row: AnalysisRow = serde_json::from_value(json!({
            "id": "abc",
            "idea": "idea",
            "created_at": "2026-01-01T00:00:00+00:00"
        }))
        .unwrap();
        let record = AnalysisRecord::from(row);
        assert_eq!(record.skill_level, crate::models::DEFAULT_SKILL_LEVEL);
        assert!(record.market.is_null());
    }
}
