//! Staged idea analysis
//!
//! Five upstream completion calls run strictly in order. Each is announced
//! with a status notification and its parsed result is pushed as soon as it
//! arrives. Only a fully completed run is persisted.

mod orchestrator;

pub use orchestrator::{AnalysisOrchestrator, PipelineState};

use crate::llm::CompletionError;
use crate::parsers::ExtractionError;
use serde_json::{json, Value};
use thiserror::Error;

/// One analytical pass, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Market,
    Technical,
    Opportunity,
    Deployment,
    Sentiment,
}

impl Stage {
    /// Every stage in the order the pipeline runs them.
    /// Sentiment must stay after market: it reuses market's competitor names.
    pub const ALL: [Stage; 5] = [
        Stage::Market,
        Stage::Technical,
        Stage::Opportunity,
        Stage::Deployment,
        Stage::Sentiment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Market => "market",
            Stage::Technical => "technical",
            Stage::Opportunity => "opportunity",
            Stage::Deployment => "deployment",
            Stage::Sentiment => "sentiment",
        }
    }

    /// Progress phrase shown while this stage runs
    pub fn status_message(&self) -> &'static str {
        match self {
            Stage::Market => "Researching existing solutions across the web...",
            Stage::Technical => "Analyzing technical requirements and stack...",
            Stage::Opportunity => "Evaluating market size and opportunity...",
            Stage::Deployment => "Identifying optimal deployment strategy...",
            Stage::Sentiment => "Gathering community sentiment and user pain points...",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification pushed to the caller while a run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Status { stage: Stage, message: String },
    StageResult { stage: Stage, data: Value },
    Complete { result_id: String },
    Error { message: String },
}

impl AnalysisEvent {
    /// Event name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisEvent::Status { .. } => "status",
            AnalysisEvent::StageResult { stage, .. } => stage.as_str(),
            AnalysisEvent::Complete { .. } => "complete",
            AnalysisEvent::Error { .. } => "error",
        }
    }

    /// JSON payload on the wire
    pub fn payload(&self) -> Value {
        match self {
            AnalysisEvent::Status { stage, message } => {
                json!({ "phase": stage.as_str(), "message": message })
            }
            AnalysisEvent::StageResult { data, .. } => data.clone(),
            AnalysisEvent::Complete { result_id } => json!({ "resultId": result_id }),
            AnalysisEvent::Error { message } => json!({ "message": message }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisEvent::Complete { .. } | AnalysisEvent::Error { .. }
        )
    }
}

/// Anything that stops a run before all stages finish
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Analysis finished with missing stage results")]
    Incomplete,
}
