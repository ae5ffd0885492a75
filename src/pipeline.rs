//! Request flow: ingestion, classification, composition
//!
//! Each run is independent; the pipeline holds only immutable configuration
//! and a shared generator handle, so concurrent runs need no coordination.

use std::sync::Arc;

use tracing::{info, instrument, Span};
use uuid::Uuid;

use crate::compliance::ComplianceClassifier;
use crate::composer::RecommendationComposer;
use crate::config::AppConfig;
use crate::error::Result;
use crate::generation::TextGenerator;
use crate::ingestion::{ingest, IngestionSettings};
use crate::models::{BiometricReading, CoachingRequest, CoachingResponse, ReadinessVerdict};

/// Offline part of a run: everything except generation
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: ReadinessVerdict,
    pub planned_activity: String,
    pub estimated_recovery_score: u8,
    pub reading: BiometricReading,
}

/// Classifier and composer wired together
#[derive(Clone)]
pub struct CoachingPipeline {
    classifier: ComplianceClassifier,
    composer: RecommendationComposer,
    ingestion: IngestionSettings,
}

impl CoachingPipeline {
    pub fn new(
        classifier: ComplianceClassifier,
        composer: RecommendationComposer,
        ingestion: IngestionSettings,
    ) -> Self {
        Self {
            classifier,
            composer,
            ingestion,
        }
    }

    /// Build a pipeline from configuration and a generator
    pub fn from_config(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(
            ComplianceClassifier::new(config.thresholds),
            RecommendationComposer::new(generator, &config.generation),
            config.ingestion.clone(),
        )
    }

    /// Normalize and classify without calling the generation service
    pub fn assess(&self, request: CoachingRequest) -> Result<Assessment> {
        let ingested = ingest(request, &self.ingestion)?;
        let verdict = self.classifier.classify(&ingested.reading)?;

        Ok(Assessment {
            verdict,
            planned_activity: ingested.planned_activity,
            estimated_recovery_score: ingested.estimated_recovery_score,
            reading: ingested.reading,
        })
    }

    /// Run the full request flow
    ///
    /// Invalid input fails before any generation call is made.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), status = tracing::field::Empty))]
    pub async fn run(&self, request: CoachingRequest) -> Result<CoachingResponse> {
        let assessment = self.assess(request)?;
        Span::current().record("status", tracing::field::display(assessment.verdict.status()));

        let recommendation = self
            .composer
            .compose(&assessment.verdict, &assessment.planned_activity)
            .await?;

        info!(
            reasons = assessment.verdict.reasons().len(),
            model = self.composer.model(),
            "Coaching recommendation ready"
        );

        Ok(CoachingResponse {
            recommendation,
            biometrics: assessment.reading,
            compliance: assessment.verdict,
            estimated_recovery_score: assessment.estimated_recovery_score,
        })
    }
}
