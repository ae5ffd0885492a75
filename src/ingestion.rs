//! Boundary normalization for coaching requests
//!
//! Turns a raw [`CoachingRequest`] into the reading the classifier sees and
//! the planned activity the composer embeds.

use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::models::{BiometricReading, CoachingRequest};

/// Ingestion options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionSettings {
    /// Classify the estimated recovery score when the caller supplied none
    #[serde(default)]
    pub use_estimated_recovery: bool,
}

/// Normalized request, ready for classification
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedRequest {
    pub reading: BiometricReading,
    pub planned_activity: String,
    pub estimated_recovery_score: u8,
}

/// Normalize a boundary request
///
/// Measurement validation is left to the classifier; this step only trims the
/// planned activity and decides which recovery score is classified.
pub fn ingest(request: CoachingRequest, settings: &IngestionSettings) -> Result<IngestedRequest> {
    let planned_activity = request.planned_activity.trim();
    if planned_activity.is_empty() {
        return Err(InputError::EmptyPlannedActivity.into());
    }

    let (reading, estimated_recovery_score) = normalize_reading(request.reading, settings);

    Ok(IngestedRequest {
        reading,
        planned_activity: planned_activity.to_string(),
        estimated_recovery_score,
    })
}

/// Attach the estimated recovery score to a reading when configured to
///
/// Returns the reading to classify and the estimate, which is reported either way.
pub fn normalize_reading(
    mut reading: BiometricReading,
    settings: &IngestionSettings,
) -> (BiometricReading, u8) {
    let estimate = estimate_recovery_score(reading.sleep_hours, reading.resting_heart_rate);

    if reading.recovery_score.is_none() && settings.use_estimated_recovery {
        reading.recovery_score = Some(f64::from(estimate));
    }

    (reading, estimate)
}

/// Estimate a 0-100 recovery score from sleep and resting heart rate
///
/// # Algorithm
///
/// - Sleep component (0-50): `sleep / 8 * 50`, capped at 50
/// - HR component (0-50): 50 at or below 50 bpm, losing 1.25 points per bpm
///   up to 70 bpm (25 points), then 1.25 per bpm down to 0 at 90 bpm
pub fn estimate_recovery_score(sleep_hours: f64, resting_hr: i32) -> u8 {
    let sleep_score = if sleep_hours.is_finite() {
        (sleep_hours / 8.0 * 50.0).clamp(0.0, 50.0)
    } else {
        0.0
    };

    let hr = f64::from(resting_hr);
    let hr_score = if hr <= 50.0 {
        50.0
    } else if hr <= 70.0 {
        50.0 - (hr - 50.0) * 1.25
    } else {
        (25.0 - (hr - 70.0) * 1.25).max(0.0)
    };

    (sleep_score + hr_score).round().clamp(0.0, 100.0) as u8
}
