// Library interface for auditrs modules
// The CLI and integration tests both go through these exports

pub mod compliance;
pub mod composer;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod logging;
pub mod models;
pub mod pipeline;

// Re-export commonly used types for convenience
pub use models::*;
pub use compliance::{classify, ComplianceClassifier, MetricBand, Thresholds};
pub use composer::{PromptTemplate, RecommendationComposer};
pub use config::{AppConfig, ApiKey, GenerationSettings};
pub use error::{AuditError, Result};
pub use generation::{GeminiClient, GenerationRequest, TextGenerator};
pub use logging::{LogConfig, LogLevel, LogFormat};
pub use pipeline::{Assessment, CoachingPipeline};
