use serde::{Deserialize, Serialize};
use std::fmt;

/// One night's biometric reading, created per request and never mutated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricReading {
    /// Hours of sleep in the prior night
    #[serde(alias = "sleep")]
    pub sleep_hours: f64,

    /// Resting heart rate in beats per minute
    #[serde(alias = "hr")]
    pub resting_heart_rate: i32,

    /// Recovery score (0-100), when the wearable supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_score: Option<f64>,
}

impl BiometricReading {
    pub fn new(sleep_hours: f64, resting_heart_rate: i32) -> Self {
        Self {
            sleep_hours,
            resting_heart_rate,
            recovery_score: None,
        }
    }

    pub fn with_recovery_score(mut self, score: f64) -> Self {
        self.recovery_score = Some(score);
        self
    }
}

/// Readiness classification, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadinessStatus {
    Optimal,
    Warning,
    Critical,
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessStatus::Optimal => write!(f, "Optimal"),
            ReadinessStatus::Warning => write!(f, "Warning"),
            ReadinessStatus::Critical => write!(f, "Critical"),
        }
    }
}

impl ReadinessStatus {
    /// Warning or Critical
    pub fn requires_pivot(&self) -> bool {
        *self != ReadinessStatus::Optimal
    }
}

/// Metrics evaluated by the compliance classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SleepHours,
    RestingHeartRate,
    RecoveryScore,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::SleepHours => write!(f, "Sleep"),
            Metric::RestingHeartRate => write!(f, "Resting HR"),
            Metric::RecoveryScore => write!(f, "Recovery score"),
        }
    }
}

impl Metric {
    /// Unit suffix used when rendering values
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::SleepHours => "h",
            Metric::RestingHeartRate => " bpm",
            Metric::RecoveryScore => "/100",
        }
    }

    /// Render a measured value with its unit
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Metric::SleepHours => {
                // One decimal unless that would round the measurement
                let short = format!("{:.1}", value);
                if short.parse::<f64>() == Ok(value) {
                    format!("{}{}", short, self.unit())
                } else {
                    format!("{}{}", value, self.unit())
                }
            }
            _ => format!("{}{}", value, self.unit()),
        }
    }
}

/// Tier reached by a single metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricAssessment {
    pub metric: Metric,
    pub value: f64,
    pub tier: ReadinessStatus,
}

/// Readiness verdict derived from a [`BiometricReading`]
///
/// Only the classifier builds verdicts, which keeps `reasons` non-empty
/// exactly when `status` is not `Optimal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessVerdict {
    status: ReadinessStatus,
    reasons: Vec<String>,
    assessments: Vec<MetricAssessment>,
}

impl ReadinessVerdict {
    pub(crate) fn from_parts(
        status: ReadinessStatus,
        reasons: Vec<String>,
        assessments: Vec<MetricAssessment>,
    ) -> Self {
        debug_assert_eq!(reasons.is_empty(), status == ReadinessStatus::Optimal);
        Self {
            status,
            reasons,
            assessments,
        }
    }

    pub fn status(&self) -> ReadinessStatus {
        self.status
    }

    /// One entry per violated threshold, in evaluation order
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Every evaluated metric, including the optimal ones
    pub fn assessments(&self) -> &[MetricAssessment] {
        &self.assessments
    }

    /// Tier reached by a given metric, if it was evaluated
    pub fn tier_for(&self, metric: Metric) -> Option<ReadinessStatus> {
        self.assessments
            .iter()
            .find(|a| a.metric == metric)
            .map(|a| a.tier)
    }
}

/// Boundary request: the reading plus the athlete's intended workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingRequest {
    #[serde(flatten)]
    pub reading: BiometricReading,

    /// Free-text description of the planned workout
    #[serde(alias = "plan")]
    pub planned_activity: String,
}

/// Boundary response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingResponse {
    /// Generated advice, verbatim
    pub recommendation: String,

    /// Reading as classified
    pub biometrics: BiometricReading,

    /// Compliance verdict embedded in the prompt
    pub compliance: ReadinessVerdict,

    /// Recovery score estimated from sleep and resting HR
    pub estimated_recovery_score: u8,
}
