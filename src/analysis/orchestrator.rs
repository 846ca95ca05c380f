// Sequential stage runner for one analysis request

use super::{AnalysisError, AnalysisEvent, Stage};
use crate::llm::CompletionClient;
use crate::models::{competitor_names, new_result_id, AnalysisRecord, AnalysisRequest};
use crate::parsers::{is_parse_error, ExtractionPolicy};
use crate::prompts;
use crate::store::ResultStore;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything a run has produced so far.
///
/// Competitor names are lifted out of the market result as soon as it lands
/// so the sentiment prompt does not need to dig through raw stage output.
#[derive(Debug, Clone)]
pub struct PipelineState {
    request: AnalysisRequest,
    market: Option<Value>,
    technical: Option<Value>,
    opportunity: Option<Value>,
    deployment: Option<Value>,
    sentiment: Option<Value>,
    competitor_names: Vec<String>,
}

impl PipelineState {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            request,
            market: None,
            technical: None,
            opportunity: None,
            deployment: None,
            sentiment: None,
            competitor_names: Vec::new(),
        }
    }

    pub fn competitor_names(&self) -> &[String] {
        &self.competitor_names
    }

    /// Instruction text for `stage` given what earlier stages produced
    pub fn prompt_for(&self, stage: Stage) -> String {
        let idea = &self.request.idea;
        match stage {
            Stage::Market => prompts::market_prompt(idea),
            Stage::Technical => prompts::technical_prompt(idea, &self.request.skill_level),
            Stage::Opportunity => prompts::opportunity_prompt(idea),
            Stage::Deployment => prompts::deployment_prompt(idea),
            Stage::Sentiment => prompts::sentiment_prompt(idea, &self.competitor_names),
        }
    }

    /// Store a stage result
    pub fn record(&mut self, stage: Stage, value: Value) {
        match stage {
            Stage::Market => {
                self.competitor_names = competitor_names(&value);
                self.market = Some(value);
            }
            Stage::Technical => self.technical = Some(value),
            Stage::Opportunity => self.opportunity = Some(value),
            Stage::Deployment => self.deployment = Some(value),
            Stage::Sentiment => self.sentiment = Some(value),
        }
    }

    /// The aggregate record, or `None` if any stage is still missing
    pub fn into_record(self, id: String) -> Option<AnalysisRecord> {
        Some(AnalysisRecord {
            id,
            idea: self.request.idea,
            skill_level: self.request.skill_level,
            market: self.market?,
            technical: self.technical?,
            opportunity: self.opportunity?,
            deployment: self.deployment?,
            sentiment: self.sentiment?,
            created_at: Utc::now(),
        })
    }
}

/// Runs the five-stage pipeline and persists the outcome
pub struct AnalysisOrchestrator {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn ResultStore>,
    policy: ExtractionPolicy,
}

impl AnalysisOrchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn ResultStore>,
        policy: ExtractionPolicy,
    ) -> Self {
        Self {
            client,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> ExtractionPolicy {
        self.policy
    }

    /// Run every stage for `request`, pushing notifications into `events`.
    ///
    /// Ends with exactly one terminal notification. Returns the result id on
    /// success. A closed receiver does not stop the run.
    pub async fn run(
        &self,
        request: AnalysisRequest,
        events: mpsc::Sender<AnalysisEvent>,
    ) -> Result<String, AnalysisError> {
        log::info!(
            "Starting analysis ({} chars, skill level '{}')",
            request.idea.len(),
            request.skill_level
        );

        let mut state = PipelineState::new(request);

        if let Err(e) = self.run_stages(&mut state, &events).await {
            log::error!("Analysis aborted: {}", e);
            emit(
                &events,
                AnalysisEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return Err(e);
        }

        let result_id = new_result_id();
        let Some(record) = state.into_record(result_id.clone()) else {
            let e = AnalysisError::Incomplete;
            log::error!("Analysis aborted: {}", e);
            emit(
                &events,
                AnalysisEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return Err(e);
        };

        self.persist(&record).await;

        log::info!("Analysis complete: {}", result_id);
        emit(
            &events,
            AnalysisEvent::Complete {
                result_id: result_id.clone(),
            },
        )
        .await;

        Ok(result_id)
    }

    async fn run_stages(
        &self,
        state: &mut PipelineState,
        events: &mpsc::Sender<AnalysisEvent>,
    ) -> Result<(), AnalysisError> {
        for stage in Stage::ALL {
            emit(
                events,
                AnalysisEvent::Status {
                    stage,
                    message: stage.status_message().to_string(),
                },
            )
            .await;

            let data = self.run_stage(stage, state).await?;
            state.record(stage, data.clone());

            emit(events, AnalysisEvent::StageResult { stage, data }).await;
        }
        Ok(())
    }

    async fn run_stage(&self, stage: Stage, state: &PipelineState) -> Result<Value, AnalysisError> {
        if stage == Stage::Sentiment {
            log::debug!(
                "Sentiment stage using {} competitor names",
                state.competitor_names().len()
            );
        }

        let prompt = state.prompt_for(stage);
        let raw = self.client.complete(&prompt).await?;
        log::debug!("Stage {} returned {} chars", stage, raw.len());

        let data = self.policy.apply(stage.as_str(), &raw)?;
        if is_parse_error(&data) {
            log::warn!("Stage {} returned unparseable output; using sentinel", stage);
        }
        Ok(data)
    }

    /// Write the record. Failures are logged only: the caller still gets the id.
    async fn persist(&self, record: &AnalysisRecord) {
        if let Err(e) = self.store.put(record).await {
            log::error!(
                "Failed to persist analysis {} to {} store: {}",
                record.id,
                self.store.backend_name(),
                e
            );
        }
    }
}

async fn emit(events: &mpsc::Sender<AnalysisEvent>, event: AnalysisEvent) {
    let name = event.name();
    if events.send(event).await.is_err() {
        log::debug!("Client disconnected; dropping '{}' notification", name);
    }
}
