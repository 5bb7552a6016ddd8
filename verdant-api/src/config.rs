//! Configuration resolution for verdant-api
//!
//! Command-line flags (with environment fallbacks) override the TOML file,
//! which overrides compiled defaults. The inference API key is resolved
//! separately: environment first, then TOML.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use verdant_common::config::{
    BlobBackend, CompiledDefaults, InferenceBackend, InferenceConfig, StorageBackend, TomlConfig,
};

/// Environment variable holding the inference API key
pub const INFERENCE_API_KEY_ENV: &str = "VERDANT_INFERENCE_API_KEY";

/// Command-line arguments for verdant-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "verdant-api")]
#[command(about = "Plant photo diagnosis and garden service")]
#[command(version)]
pub struct Cli {
    /// TOML config file (default: ~/.config/verdant/verdant.toml)
    #[arg(short, long, env = "VERDANT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder holding the database and stored photos
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "VERDANT_BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Relational store: sqlite or memory
    #[arg(long, env = "VERDANT_STORAGE_BACKEND")]
    pub storage: Option<StorageBackend>,

    /// Photo store: filesystem or memory
    #[arg(long, env = "VERDANT_BLOB_BACKEND")]
    pub blobs: Option<BlobBackend>,

    /// Inference service: gemini or mock
    #[arg(long, env = "VERDANT_INFERENCE_BACKEND")]
    pub inference: Option<InferenceBackend>,

    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "VERDANT_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Effective settings after merging CLI, TOML and defaults
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub default_user_id: String,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub log_level: String,
    pub storage_backend: StorageBackend,
    pub blob_backend: BlobBackend,
    pub public_base_url: Option<String>,
    pub inference: InferenceConfig,
}

impl ServiceConfig {
    pub fn resolve(cli: &Cli, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let mut inference = toml.inference.clone();
        if let Some(backend) = cli.inference {
            inference.backend = backend;
        }

        Self {
            bind_address: cli
                .bind
                .clone()
                .or_else(|| toml.bind_address.clone())
                .unwrap_or(defaults.bind_address),
            default_user_id: toml
                .default_user_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.default_user_id),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            request_timeout: Duration::from_secs(
                toml.request_timeout_secs
                    .unwrap_or(defaults.request_timeout_secs),
            ),
            log_level: [cli.log_level.as_deref(), Some(toml.logging.level.as_str())]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|level| !level.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.log_level),
            storage_backend: cli.storage.unwrap_or(toml.storage.backend),
            blob_backend: cli.blobs.unwrap_or(toml.blobs.backend),
            public_base_url: toml.blobs.public_base_url.clone(),
            inference,
        }
    }
}

/// Resolve the inference API key
///
/// **Priority:** ENV → TOML. Returns `None` when neither holds a usable key.
pub fn resolve_inference_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(INFERENCE_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .inference
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Inference API key found in multiple sources: environment, TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Inference API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Inference API key loaded from TOML config");
        return Some(key);
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_toml() {
        let toml: TomlConfig = toml::from_str(
            r#"
            bind_address = "127.0.0.1:8000"
            default_user_id = "gardener"

            [storage]
            backend = "memory"

            [inference]
            backend = "gemini"
            "#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "verdant-api",
            "--bind",
            "127.0.0.1:9000",
            "--inference",
            "mock",
        ]);
        let config = ServiceConfig::resolve(&cli, &toml);

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.default_user_id, "gardener");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.inference.backend, InferenceBackend::Mock);
    }

    #[test]
    fn test_defaults_apply() {
        let config = ServiceConfig::resolve(&Cli::default(), &TomlConfig::default());

        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.blob_backend, BlobBackend::Filesystem);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_blank_log_level_falls_back_to_default() {
        let mut toml = TomlConfig::default();
        toml.logging.level = "  ".to_string();

        let config = ServiceConfig::resolve(&Cli::default(), &toml);
        assert_eq!(config.log_level, "info");

        let cli = Cli::parse_from(["verdant-api", "--log-level", "debug"]);
        assert_eq!(ServiceConfig::resolve(&cli, &toml).log_level, "debug");
    }

    #[test]
    fn test_unknown_backend_rejected_by_cli() {
        let result = Cli::try_parse_from(["verdant-api", "--storage", "postgres"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }
}
