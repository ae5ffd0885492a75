//! End-to-end request flow tests with in-process generators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use auditrs::error::{GenerationError, InputError, UnavailableError};
use auditrs::{
    AppConfig, AuditError, CoachingPipeline, CoachingRequest, GenerationRequest, ReadinessStatus,
    Result, TextGenerator,
};

/// Returns the prompt it was given and counts calls
#[derive(Default)]
struct RecordingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.prompt.clone())
    }
}

struct FailingGenerator {
    transient: bool,
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        if self.transient {
            Err(GenerationError::Network {
                reason: "connection reset".to_string(),
            }
            .into())
        } else {
            Err(UnavailableError::QuotaExhausted {
                message: "daily quota reached".to_string(),
            }
            .into())
        }
    }
}

fn parse_request(json: &str) -> CoachingRequest {
    serde_json::from_str(json).unwrap()
}

fn pipeline_with(generator: Arc<dyn TextGenerator>) -> CoachingPipeline {
    CoachingPipeline::from_config(&AppConfig::default(), generator)
}

#[tokio::test]
async fn test_warning_request_end_to_end() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline_with(generator.clone());

    let request = parse_request(r#"{"sleep": 6.0, "hr": 60, "plan": "Tempo run 10k"}"#);
    let response = pipeline.run(request).await.unwrap();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.compliance.status(), ReadinessStatus::Warning);
    assert_eq!(response.compliance.reasons().len(), 1);
    assert!(response.compliance.reasons()[0].contains("Sleep"));
    assert!(response.recommendation.contains("Readiness status: Warning"));
    assert!(response.recommendation.contains("Tempo run 10k"));
}

#[tokio::test]
async fn test_critical_request_mentions_heart_rate() {
    let pipeline = pipeline_with(Arc::new(RecordingGenerator::default()));

    let request = parse_request(r#"{"sleepHours": 5.5, "restingHeartRate": 90, "plannedActivity": "Heavy squats"}"#);
    let response = pipeline.run(request).await.unwrap();

    assert_eq!(response.compliance.status(), ReadinessStatus::Critical);
    let hr_reasons: Vec<_> = response
        .compliance
        .reasons()
        .iter()
        .filter(|r| r.contains("Resting HR"))
        .collect();
    assert_eq!(hr_reasons.len(), 1);
    assert!(hr_reasons[0].contains("Critical"));
}

#[tokio::test]
async fn test_optimal_request_has_no_reasons() {
    let pipeline = pipeline_with(Arc::new(RecordingGenerator::default()));

    let request = parse_request(r#"{"sleep": 8.0, "hr": 52, "recoveryScore": 80, "plan": "Long ride"}"#);
    let response = pipeline.run(request).await.unwrap();

    assert_eq!(response.compliance.status(), ReadinessStatus::Optimal);
    assert!(response.compliance.reasons().is_empty());
    assert_eq!(response.biometrics.recovery_score, Some(80.0));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_generator() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline_with(generator.clone());

    let negative_sleep = parse_request(r#"{"sleep": -1.0, "hr": 60, "plan": "Run"}"#);
    let result = pipeline.run(negative_sleep).await;
    assert!(matches!(
        result,
        Err(AuditError::InvalidInput(InputError::NegativeSleep { .. }))
    ));

    let zero_hr = parse_request(r#"{"sleep": 7.0, "hr": 0, "plan": "Run"}"#);
    assert!(matches!(
        pipeline.run(zero_hr).await,
        Err(AuditError::InvalidInput(_))
    ));

    let blank_plan = parse_request(r#"{"sleep": 7.0, "hr": 60, "plan": "  "}"#);
    assert!(matches!(
        pipeline.run(blank_plan).await,
        Err(AuditError::InvalidInput(InputError::EmptyPlannedActivity))
    ));

    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failures_propagate_by_kind() {
    let request = || parse_request(r#"{"sleep": 7.5, "hr": 58, "plan": "Swim"}"#);

    let transient = pipeline_with(Arc::new(FailingGenerator { transient: true }))
        .run(request())
        .await
        .unwrap_err();
    assert!(transient.is_retryable());
    assert!(matches!(transient, AuditError::GenerationService(_)));

    let unavailable = pipeline_with(Arc::new(FailingGenerator { transient: false }))
        .run(request())
        .await
        .unwrap_err();
    assert!(!unavailable.is_retryable());
    assert!(matches!(
        unavailable,
        AuditError::GenerationServiceUnavailable(UnavailableError::QuotaExhausted { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = Arc::new(pipeline_with(generator.clone()));

    let handles: Vec<_> = [(8.0, 50), (6.0, 60), (4.0, 95)]
        .into_iter()
        .map(|(sleep, hr)| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let request = CoachingRequest {
                    reading: auditrs::BiometricReading::new(sleep, hr),
                    planned_activity: format!("Plan for {}h", sleep),
                };
                pipeline.run(request).await.unwrap()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap().compliance.status());
    }

    assert_eq!(
        statuses,
        vec![
            ReadinessStatus::Optimal,
            ReadinessStatus::Warning,
            ReadinessStatus::Critical
        ]
    );
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_assess_reports_estimate_without_classifying_it() {
    let pipeline = pipeline_with(Arc::new(RecordingGenerator::default()));

    let assessment = pipeline
        .assess(parse_request(r#"{"sleep": 5.5, "hr": 90, "plan": "Heavy squats"}"#))
        .unwrap();

    assert_eq!(assessment.estimated_recovery_score, 34);
    assert_eq!(assessment.reading.recovery_score, None);
    assert_eq!(assessment.verdict.assessments().len(), 2);
}
