use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compliance::Thresholds;
use crate::error::{AuditError, Result};
use crate::generation::gemini::API_BASE_URL;
use crate::generation::DEFAULT_MODEL;
use crate::ingestion::IngestionSettings;
use crate::logging::LogConfig;

/// Environment variable holding the generation service credential
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Readiness thresholds
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Generation service settings
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Request normalization options
    #[serde(default)]
    pub ingestion: IngestionSettings,

    /// Logging setup
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Generation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier sent with every request
    pub model: String,

    /// API base URL
    pub api_base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Upper bound on a single generation call
    pub timeout_secs: u64,

    pub temperature: Option<f32>,

    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            model: DEFAULT_MODEL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable
    ///
    /// # Errors
    ///
    /// `Configuration` when the variable is unset or blank.
    pub fn resolve_api_key(&self) -> Result<ApiKey> {
        match std::env::var(&self.api_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(ApiKey::new(value.trim())),
            _ => Err(AuditError::Configuration(format!(
                "{} environment variable not set",
                self.api_key_env
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AuditError::Configuration("generation.model is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AuditError::Configuration(
                "generation.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generation service credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        ApiKey(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            thresholds: Thresholds::default(),
            generation: GenerationSettings::default(),
            ingestion: IngestionSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            AuditError::Configuration(format!(
                "Failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        // Update modification timestamp
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self).map_err(|e| {
            AuditError::Internal(format!("Failed to serialize configuration: {}", e))
        })?;

        fs::write(&path, toml_content)?;
        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".auditrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    ///
    /// A missing file falls back to defaults; a file that exists but does
    /// not parse or validate is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            if path.is_some() {
                return Err(AuditError::Configuration(format!(
                    "Config file not found: {}",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        Self::load_from_file(&config_path)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.generation.validate()?;
        Ok(())
    }
}
