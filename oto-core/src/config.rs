use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OtoConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the manifest, the page template and the fragments come from.
///
/// Fragments are read from `root_dir` unless `base_url` is set, in which case
/// they are fetched over HTTP relative to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    #[serde(default = "default_template_path")]
    pub template_path: String,

    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

fn default_manifest_path() -> String {
    "config/modules.json".to_string()
}

fn default_template_path() -> String {
    "index.html".to_string()
}

fn default_root_dir() -> String {
    "public".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            template_path: default_template_path(),
            root_dir: default_root_dir(),
            base_url: String::new(),
            output_path: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl OtoConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("OTO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut oto_config: OtoConfig = config.try_deserialize()?;

        if let Ok(level) = std::env::var("OTO_LOG_LEVEL") {
            oto_config.logging.level = level;
        }

        if let Ok(url) = std::env::var("OTO_BASE_URL") {
            oto_config.loader.base_url = url;
        }

        oto_config.validate()?;

        Ok(oto_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.loader.manifest_path.is_empty() {
            return Err(ConfigLoadError::MissingRequired(
                "loader.manifest_path".to_string(),
            ));
        }

        if self.loader.base_url.is_empty() && self.loader.root_dir.is_empty() {
            return Err(ConfigLoadError::MissingRequired(
                "loader.root_dir or loader.base_url".to_string(),
            ));
        }

        if !self.loader.base_url.is_empty()
            && !self.loader.base_url.starts_with("http://")
            && !self.loader.base_url.starts_with("https://")
        {
            return Err(ConfigLoadError::InvalidValue {
                key: "loader.base_url".to_string(),
                message: "Must be an absolute URL starting with http:// or https://".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn uses_http(&self) -> bool {
        !self.loader.base_url.is_empty()
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("oto.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let mut env_paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        env_paths.push(cwd.join(".env"));
        env_paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        env_paths.push(config_dir.join(".env"));
    }

    for path in env_paths {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("oto"))
}
