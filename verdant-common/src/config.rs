//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting that can come from several places:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup: the compiled
//! defaults apply and the caller reports the problem once logging is up.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "VERDANT_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "verdant.db";

/// Blob directory name inside the root folder
pub const BLOB_DIR_NAME: &str = "blobs";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Relational store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database in the root folder
    #[default]
    Sqlite,
    /// Process-local store, contents lost on restart
    Memory,
}

/// Blob store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    /// Files under `<root>/blobs`, served at `/media`
    #[default]
    Filesystem,
    /// Process-local store, contents lost on restart
    Memory,
}

/// Inference service selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    /// Hosted multimodal model (Gemini generateContent API)
    #[default]
    Gemini,
    /// Canned diagnosis, no network access
    Mock,
}

fn unknown_backend(kind: &str, value: &str, expected: &str) -> Error {
    Error::Config(format!(
        "unknown {} backend '{}' (expected one of: {})",
        kind, value, expected
    ))
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(unknown_backend("storage", other, "sqlite, memory")),
        }
    }
}

impl FromStr for BlobBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filesystem" => Ok(BlobBackend::Filesystem),
            "memory" => Ok(BlobBackend::Memory),
            other => Err(unknown_backend("blob", other, "filesystem, memory")),
        }
    }
}

impl FromStr for InferenceBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(InferenceBackend::Gemini),
            "mock" => Ok(InferenceBackend::Mock),
            other => Err(unknown_backend("inference", other, "gemini, mock")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    /// Prefix for public blob URLs, e.g. `https://cdn.example.com/media`
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub backend: InferenceBackend,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
            api_key: None,
        }
    }
}

/// Contents of `verdant.toml`
///
/// Every field is optional; absent values fall back to [`CompiledDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub default_user_id: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub blobs: BlobConfig,
    pub inference: InferenceConfig,
}

/// Fallback values compiled into the binary
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub default_user_id: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_address: "0.0.0.0:3000".to_string(),
            default_user_id: "anonymous".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 120,
            log_level: "info".to_string(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("verdant"))
        .unwrap_or_else(|| PathBuf::from("./verdant_data"))
}

/// Default location of the TOML file (`~/.config/verdant/verdant.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("verdant").join("verdant.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the effective TOML settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at the expected location (or no config directory at all)
    Missing(Option<PathBuf>),
    /// File present but unreadable or malformed; defaults apply
    Invalid { path: PathBuf, error: String },
}

/// Load the TOML file if present, otherwise defaults
///
/// Never fails: an unreadable file yields defaults plus a
/// [`ConfigSource::Invalid`] for the caller to report. Loading happens before
/// the tracing subscriber exists, so this function does not log.
pub fn load_toml_config_or_default(path: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => return (TomlConfig::default(), ConfigSource::Missing(None)),
    };

    if !path.exists() {
        return (TomlConfig::default(), ConfigSource::Missing(Some(path)));
    }

    match load_toml_config(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(e) => (
            TomlConfig::default(),
            ConfigSource::Invalid {
                path,
                error: e.to_string(),
            },
        ),
    }
}

/// Resolves the root folder holding the database and blobs
pub struct RootFolderResolver {
    service_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_root(mut self, path: Option<PathBuf>) -> Self {
        self.toml_root = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(service = %self.service_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(service = %self.service_name, "Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!(service = %self.service_name, "Root folder from config file: {}", path.display());
            return path.clone();
        }

        let path = CompiledDefaults::for_current_platform().root_folder;
        info!(service = %self.service_name, "Root folder (default): {}", path.display());
        path
    }
}

/// Creates the root folder layout and hands out paths inside it
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create root and blob directories if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.blob_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    pub fn blob_path(&self) -> PathBuf {
        self.root.join(BLOB_DIR_NAME)
    }
}
