//! Unified error hierarchy for auditrs
//!
//! Classification failures are client errors, generation failures split into
//! transient (`GenerationService`) and non-transient
//! (`GenerationServiceUnavailable`) so the boundary can decide whether a
//! whole-request retry makes sense. Nothing in the core retries on its own.

use thiserror::Error;

/// Top-level error type for all auditrs operations
#[derive(Debug, Error)]
pub enum AuditError {
    /// Malformed biometric values or planned activity
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Transient failure of the generation service (timeout, network, 5xx)
    #[error("Generation service error: {0}")]
    GenerationService(#[from] GenerationError),

    /// Non-transient failure of the generation service (credential, quota)
    #[error("Generation service unavailable: {0}")]
    GenerationServiceUnavailable(#[from] UnavailableError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejected caller input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Sleep duration below zero
    #[error("sleep hours must not be negative (got {value})")]
    NegativeSleep { value: f64 },

    /// Resting heart rate of zero or below
    #[error("resting heart rate must be positive (got {value})")]
    NonPositiveHeartRate { value: i32 },

    /// Recovery score outside 0-100
    #[error("recovery score must be within 0-100 (got {value})")]
    RecoveryScoreOutOfRange { value: f64 },

    /// NaN or infinite measurement
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    /// Planned activity missing or blank
    #[error("planned activity must not be empty")]
    EmptyPlannedActivity,

    /// Planned activity would break out of its prompt section
    #[error("planned activity must not contain the sequence {delimiter:?}")]
    ReservedDelimiter { delimiter: &'static str },
}

/// Transient generation failures; the caller may retry the whole request
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No response within the configured bound
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Connection or transport failure
    #[error("network failure: {reason}")]
    Network { reason: String },

    /// Server-side failure reported by the provider
    #[error("provider returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Success status but no usable text
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Body could not be decoded
    #[error("malformed provider response: {reason}")]
    MalformedResponse { reason: String },
}

/// Non-transient generation failures; retrying cannot succeed
#[derive(Debug, Error)]
pub enum UnavailableError {
    /// Credential missing, invalid or lacking permission
    #[error("credential rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Quota or rate budget exhausted
    #[error("quota exhausted: {message}")]
    QuotaExhausted { message: String },

    /// Model identifier not served by the provider
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// Request refused for another client-side reason
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Result type alias for auditrs operations
pub type Result<T> = std::result::Result<T, AuditError>;

impl AuditError {
    /// Check if the whole request may be retried by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuditError::GenerationService(_))
    }

    /// Whether the caller sent something wrong
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuditError::InvalidInput(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AuditError::InvalidInput(_) => ErrorSeverity::Warning,
            AuditError::GenerationService(_) => ErrorSeverity::Error,
            AuditError::GenerationServiceUnavailable(_) => ErrorSeverity::Critical,
            AuditError::Configuration(_) => ErrorSeverity::Critical,
            AuditError::Internal(_) => ErrorSeverity::Critical,
            AuditError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AuditError::InvalidInput(e) => format!("Please check your input: {}", e),
            AuditError::GenerationService(GenerationError::Timeout { seconds }) => {
                format!(
                    "The coaching service did not answer within {} seconds. Please try again.",
                    seconds
                )
            }
            AuditError::GenerationService(_) => {
                "The coaching service is temporarily unreachable. Please try again.".to_string()
            }
            AuditError::GenerationServiceUnavailable(UnavailableError::Unauthorized { .. }) => {
                "The coaching service rejected the configured API key.".to_string()
            }
            AuditError::GenerationServiceUnavailable(UnavailableError::QuotaExhausted {
                ..
            }) => "The coaching service quota is exhausted.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Process exit code used by the CLI boundary
    pub fn exit_code(&self) -> i32 {
        match self {
            AuditError::InvalidInput(_) => 2,
            AuditError::GenerationService(_) => 3,
            AuditError::GenerationServiceUnavailable(_) | AuditError::Configuration(_) => 4,
            AuditError::Io(_) | AuditError::Internal(_) => 1,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Service or configuration broken; operator attention needed
    Critical,
    /// Request failed but the system is healthy
    Error,
    /// Caller mistake
    Warning,
}
