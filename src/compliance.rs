//! Readiness compliance classification
//!
//! Each supplied metric is compared against its own three-tier band and the
//! overall status is the most severe tier reached by any metric.
//!
//! | Metric | Optimal | Warning | Critical |
//! |---|---|---|---|
//! | Sleep hours | >= 7 | < 7 and >= 5 | < 5 |
//! | Resting HR (bpm) | <= 75 | > 75 and <= 85 | > 85 |
//! | Recovery score | >= 60 | < 60 and >= 40 | < 40 |
//!
//! A value sitting exactly on a bound lands in the better tier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuditError, InputError, Result};
use crate::models::{BiometricReading, Metric, MetricAssessment, ReadinessStatus, ReadinessVerdict};

/// Which side of a band is the unhealthy one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lower values are worse (sleep, recovery)
    LowerIsWorse,
    /// Higher values are worse (resting heart rate)
    HigherIsWorse,
}

/// Three-tier band for a single metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBand {
    /// Bound past which the metric is at least Warning
    pub warning: f64,
    /// Bound past which the metric is Critical
    pub critical: f64,
    pub direction: Direction,
}

impl MetricBand {
    pub const fn lower_is_worse(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: Direction::LowerIsWorse,
        }
    }

    pub const fn higher_is_worse(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: Direction::HigherIsWorse,
        }
    }

    /// Tier reached by `value`; bounds belong to the better tier
    pub fn tier(&self, value: f64) -> ReadinessStatus {
        match self.direction {
            Direction::LowerIsWorse => {
                if value >= self.warning {
                    ReadinessStatus::Optimal
                } else if value >= self.critical {
                    ReadinessStatus::Warning
                } else {
                    ReadinessStatus::Critical
                }
            }
            Direction::HigherIsWorse => {
                if value <= self.warning {
                    ReadinessStatus::Optimal
                } else if value <= self.critical {
                    ReadinessStatus::Warning
                } else {
                    ReadinessStatus::Critical
                }
            }
        }
    }

    /// Bound that was crossed to reach `tier`
    fn bound_for(&self, tier: ReadinessStatus) -> f64 {
        match tier {
            ReadinessStatus::Critical => self.critical,
            _ => self.warning,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.warning.is_finite() || !self.critical.is_finite() {
            return Err(AuditError::Configuration(format!(
                "{} thresholds must be finite",
                name
            )));
        }

        let ordered = match self.direction {
            Direction::LowerIsWorse => self.critical < self.warning,
            Direction::HigherIsWorse => self.critical > self.warning,
        };
        if !ordered {
            return Err(AuditError::Configuration(format!(
                "{} critical bound {} must be strictly worse than warning bound {}",
                name, self.critical, self.warning
            )));
        }

        Ok(())
    }
}

/// Threshold set used by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub sleep_hours: MetricBand,
    pub resting_heart_rate: MetricBand,
    pub recovery_score: MetricBand,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sleep_hours: MetricBand::lower_is_worse(7.0, 5.0),
            resting_heart_rate: MetricBand::higher_is_worse(75.0, 85.0),
            recovery_score: MetricBand::lower_is_worse(60.0, 40.0),
        }
    }
}

impl Thresholds {
    /// Check every band is ordered and finite
    pub fn validate(&self) -> Result<()> {
        self.sleep_hours.validate("sleep_hours")?;
        self.resting_heart_rate.validate("resting_heart_rate")?;
        self.recovery_score.validate("recovery_score")?;
        Ok(())
    }

    pub fn band(&self, metric: Metric) -> &MetricBand {
        match metric {
            Metric::SleepHours => &self.sleep_hours,
            Metric::RestingHeartRate => &self.resting_heart_rate,
            Metric::RecoveryScore => &self.recovery_score,
        }
    }
}

/// Pure classifier over a fixed threshold set
#[derive(Debug, Clone, Default)]
pub struct ComplianceClassifier {
    thresholds: Thresholds,
}

impl ComplianceClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a reading into a readiness verdict
    ///
    /// # Errors
    ///
    /// `InvalidInput` for negative or non-finite sleep, a resting heart rate
    /// of zero or below, or a recovery score outside 0-100.
    pub fn classify(&self, reading: &BiometricReading) -> Result<ReadinessVerdict> {
        validate_reading(reading)?;

        let mut measurements = vec![
            (Metric::SleepHours, reading.sleep_hours),
            (Metric::RestingHeartRate, f64::from(reading.resting_heart_rate)),
        ];
        if let Some(score) = reading.recovery_score {
            measurements.push((Metric::RecoveryScore, score));
        }

        let assessments: Vec<MetricAssessment> = measurements
            .into_iter()
            .map(|(metric, value)| MetricAssessment {
                metric,
                value,
                tier: self.thresholds.band(metric).tier(value),
            })
            .collect();

        let status = assessments
            .iter()
            .map(|a| a.tier)
            .max()
            .unwrap_or(ReadinessStatus::Optimal);

        let reasons: Vec<String> = assessments
            .iter()
            .filter(|a| a.tier != ReadinessStatus::Optimal)
            .map(|a| self.describe(a))
            .collect();

        debug!(%status, reasons = reasons.len(), "Reading classified");

        Ok(ReadinessVerdict::from_parts(status, reasons, assessments))
    }

    fn describe(&self, assessment: &MetricAssessment) -> String {
        let band = self.thresholds.band(assessment.metric);
        let bound = band.bound_for(assessment.tier);
        let verb = match band.direction {
            Direction::LowerIsWorse => "is below",
            Direction::HigherIsWorse => "exceeds",
        };
        let bound_unit = match assessment.metric {
            Metric::SleepHours => "h",
            _ => "",
        };

        format!(
            "{} {} {} {} threshold of {}{}",
            assessment.metric,
            assessment.metric.format_value(assessment.value),
            verb,
            assessment.tier,
            bound,
            bound_unit
        )
    }
}

/// Classify with the default thresholds
pub fn classify(reading: &BiometricReading) -> Result<ReadinessVerdict> {
    ComplianceClassifier::default().classify(reading)
}

fn validate_reading(reading: &BiometricReading) -> Result<()> {
    if !reading.sleep_hours.is_finite() {
        return Err(InputError::NotFinite {
            field: "sleep hours",
        }
        .into());
    }
    if reading.sleep_hours < 0.0 {
        return Err(InputError::NegativeSleep {
            value: reading.sleep_hours,
        }
        .into());
    }
    if reading.resting_heart_rate <= 0 {
        return Err(InputError::NonPositiveHeartRate {
            value: reading.resting_heart_rate,
        }
        .into());
    }
    if let Some(score) = reading.recovery_score {
        if !score.is_finite() {
            return Err(InputError::NotFinite {
                field: "recovery score",
            }
            .into());
        }
        if !(0.0..=100.0).contains(&score) {
            return Err(InputError::RecoveryScoreOutOfRange { value: score }.into());
        }
    }
    Ok(())
}
