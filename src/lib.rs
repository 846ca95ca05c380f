// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::needless_borrows_for_generic_args)] // Explicit borrows clarify intent

// Module declarations
pub mod analysis;
pub mod config;
pub mod llm;
pub mod models;
pub mod parsers;
pub mod prompts;
pub mod shutdown;
pub mod store;

// Server module (HTTP/SSE API)
pub mod server;

pub use analysis::{AnalysisEvent, AnalysisOrchestrator, Stage};
pub use config::{AppConfig, ConfigError};
pub use models::{AnalysisRecord, AnalysisRequest};
