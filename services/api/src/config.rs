//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;
use triathlon_core::{GenerationProfile, Strictness};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which text-generation backend serves program requests.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderConfig {
    /// Anthropic Messages API with a fixed model.
    Anthropic {
        api_key: String,
        model: String,
        base_url: String,
    },
    /// An Azure OpenAI deployment reached through the OpenAI-compatible API.
    AzureAi {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub provider: ProviderConfig,
    pub program_max_tokens: Option<u32>,
    pub week_max_tokens: Option<u32>,
    pub strictness: Strictness,
}

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_of = |names: &[&str]| names.iter().find_map(|n| lookup(n).filter(|v| !v.is_empty()));

        // --- Load Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://workouts.db?mode=rwc".to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8000".to_string());

        // --- Load the Provider Settings (credentials are required up front) ---
        let provider_name = lookup("LLM_PROVIDER").unwrap_or_else(|| "anthropic".to_string());
        let provider = match provider_name.trim().to_lowercase().as_str() {
            "anthropic" => ProviderConfig::Anthropic {
                api_key: first_of(&["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"])
                    .ok_or_else(|| ConfigError::MissingVar("ANTHROPIC_API_KEY".to_string()))?,
                model: lookup("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                base_url: lookup("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            },
            "azure_ai" => ProviderConfig::AzureAi {
                endpoint: first_of(&["AZURE_AI_ENDPOINT", "AZURE_OPENAI_ENDPOINT"])
                    .ok_or_else(|| ConfigError::MissingVar("AZURE_AI_ENDPOINT".to_string()))?,
                api_key: first_of(&["AZURE_AI_API_KEY", "AZURE_OPENAI_API_KEY", "AZURE_OPENAI_KEY"])
                    .ok_or_else(|| ConfigError::MissingVar("AZURE_AI_API_KEY".to_string()))?,
                deployment: first_of(&[
                    "AZURE_AI_DEPLOYMENT_NAME",
                    "AZURE_OPENAI_DEPLOYMENT_NAME",
                    "AZURE_OPENAI_DEPLOYMENT",
                ])
                .ok_or_else(|| ConfigError::MissingVar("AZURE_AI_DEPLOYMENT_NAME".to_string()))?,
                api_version: first_of(&["AZURE_AI_API_VERSION", "AZURE_OPENAI_API_VERSION"])
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of: anthropic, azure_ai", other),
                ))
            }
        };

        // --- Load Generation Settings ---
        let program_max_tokens = parse_optional(&lookup, "PROGRAM_MAX_OUTPUT_TOKENS")?;
        let week_max_tokens = parse_optional(&lookup, "WEEK_MAX_OUTPUT_TOKENS")?;
        let strictness = match lookup("SCHEMA_STRICTNESS") {
            Some(raw) => raw
                .parse::<Strictness>()
                .map_err(|e| ConfigError::InvalidValue("SCHEMA_STRICTNESS".to_string(), e))?,
            None => Strictness::Lenient,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            provider,
            program_max_tokens,
            week_max_tokens,
            strictness,
        })
    }

    /// Call settings for the configured provider.
    ///
    /// The Anthropic binding asks for the whole program at once; the Azure
    /// binding switches to week-by-week generation above six weeks.
    pub fn generation_profile(&self) -> GenerationProfile {
        let base = match self.provider {
            ProviderConfig::Anthropic { .. } => GenerationProfile {
                program_max_tokens: 8_000,
                week_max_tokens: 4_000,
                temperature: Some(0.7),
                json_object: false,
                progressive_above_weeks: None,
                strictness: self.strictness,
            },
            ProviderConfig::AzureAi { .. } => GenerationProfile {
                strictness: self.strictness,
                ..GenerationProfile::default()
            },
        };
        GenerationProfile {
            program_max_tokens: self.program_max_tokens.unwrap_or(base.program_max_tokens),
            week_max_tokens: self.week_max_tokens.unwrap_or(base.week_max_tokens),
            ..base
        }
    }
}

fn parse_optional<F>(lookup: &F, name: &str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
        })
        .transpose()
}
