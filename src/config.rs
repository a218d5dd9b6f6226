//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use thiserror::Error;

use crate::drift::DiffDepth;
use crate::inference::ArraySampling;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Railway/Docker
            port: 3000,
        }
    }
}

/// Object store layout configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Prefix prepended to every contract object key
    pub contracts_prefix: String,
    /// Key of the transform job script used for patch suggestions
    pub transform_script_key: String,
    /// Prefix under which patch proposals are written
    pub patch_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            contracts_prefix: String::new(),
            transform_script_key: "scripts/transform_job.py".to_string(),
            patch_prefix: "patches/".to_string(),
        }
    }
}

/// Analysis pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub diff_depth: DiffDepth,
    pub array_sampling: ArraySampling,
    pub approval_ttl_days: i64,
    pub history_ttl_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            diff_depth: DiffDepth::Recursive,
            array_sampling: ArraySampling::FirstElement,
            approval_ttl_days: 30,
            history_ttl_days: 90,
        }
    }
}

/// Advisory model configuration
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub mode: AdvisoryMode,
    pub endpoint: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryMode {
    Stub,
    Http,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            mode: AdvisoryMode::Stub,
            endpoint: None,
            model: "schema-advisor".to_string(),
            timeout_ms: 10_000,
            max_tokens: 1_000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub advisory: AdvisoryConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let store = StoreConfig {
            contracts_prefix: std::env::var("CONTRACTS_PREFIX").unwrap_or_default(),
            transform_script_key: std::env::var("TRANSFORM_SCRIPT_KEY")
                .unwrap_or_else(|_| StoreConfig::default().transform_script_key),
            patch_prefix: std::env::var("PATCH_PREFIX")
                .unwrap_or_else(|_| StoreConfig::default().patch_prefix),
        };

        let diff_depth = match std::env::var("DIFF_DEPTH") {
            Ok(s) => Self::parse_diff_depth(&s)?,
            Err(_) => DiffDepth::Recursive,
        };

        let array_sampling = match std::env::var("ARRAY_SAMPLING") {
            Ok(s) => Self::parse_array_sampling(&s)?,
            Err(_) => ArraySampling::FirstElement,
        };

        let pipeline = PipelineConfig {
            diff_depth,
            array_sampling,
            approval_ttl_days: std::env::var("APPROVAL_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            history_ttl_days: std::env::var("HISTORY_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(90),
        };

        let mode = match std::env::var("ADVISORY_MODE") {
            Ok(s) => Self::parse_advisory_mode(&s)?,
            Err(_) => AdvisoryMode::Stub,
        };

        let endpoint = std::env::var("ADVISORY_ENDPOINT").ok();
        if mode == AdvisoryMode::Http {
            let raw = endpoint
                .as_deref()
                .ok_or_else(|| ConfigError::MissingVar("ADVISORY_ENDPOINT".to_string()))?;
            url::Url::parse(raw).map_err(|_| {
                ConfigError::InvalidValue(
                    "Invalid ADVISORY_ENDPOINT format (expected http(s)://...)".to_string(),
                )
            })?;
        }

        let advisory = AdvisoryConfig {
            mode,
            endpoint,
            model: std::env::var("ADVISORY_MODEL")
                .unwrap_or_else(|_| AdvisoryConfig::default().model),
            timeout_ms: std::env::var("ADVISORY_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            max_tokens: std::env::var("ADVISORY_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        Ok(Self {
            server,
            store,
            pipeline,
            advisory,
            cors,
        })
    }

    fn parse_diff_depth(s: &str) -> Result<DiffDepth, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "recursive" => Ok(DiffDepth::Recursive),
            "top_level" => Ok(DiffDepth::TopLevel),
            other => Err(ConfigError::InvalidValue(format!(
                "Unknown DIFF_DEPTH '{other}' (expected 'recursive' or 'top_level')"
            ))),
        }
    }

    fn parse_array_sampling(s: &str) -> Result<ArraySampling, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "first_element" => Ok(ArraySampling::FirstElement),
            "dominant" => {
                let sample_limit = std::env::var("ARRAY_SAMPLE_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10);
                Ok(ArraySampling::Dominant { sample_limit })
            }
            other => Err(ConfigError::InvalidValue(format!(
                "Unknown ARRAY_SAMPLING '{other}' (expected 'first_element' or 'dominant')"
            ))),
        }
    }

    fn parse_advisory_mode(s: &str) -> Result<AdvisoryMode, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "stub" => Ok(AdvisoryMode::Stub),
            "http" => Ok(AdvisoryMode::Http),
            other => Err(ConfigError::InvalidValue(format!(
                "Unknown ADVISORY_MODE '{other}' (expected 'stub' or 'http')"
            ))),
        }
    }
}
