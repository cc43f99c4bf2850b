//! Error types for the OTO core library.
//!
//! Every failure the loader can observe is an [`OtoError`]. Per-module errors
//! are captured into the loader's error report instead of aborting sibling
//! modules; their `Display` text is exactly what lands in that report, so the
//! error codes are kept out of the message and exposed through
//! [`OtoError::error_code`] instead.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Module | Lookup, fetch, and mount failures for a single module |
//! | E2001-E2099 | Config | Configuration files, values, and manifest validation |
//! | E9001-E9099 | General | Internal, HTTP transport, IO, and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// The main error type for the OTO core library.
#[derive(Debug, Error)]
pub enum OtoError {
    // ========================================================================
    // Module Errors (E1001-E1099)
    // ========================================================================
    /// Requested module name is absent from the manifest
    #[error("Module \"{0}\" not found in configuration")]
    NotFound(String),

    /// Fetch completed with a non-success HTTP status
    #[error("Failed to load module \"{module}\": {status}")]
    FetchFailed { module: String, status: u16 },

    /// Transport-level failure surfaced by the fetcher
    #[error("Network error loading module \"{module}\": {message}")]
    NetworkError { module: String, message: String },

    /// Mount selector resolved to no element
    #[error("Target element \"{0}\" not found")]
    MountTargetMissing(String),

    /// Mount attempted before the module was loaded
    #[error("Module \"{0}\" not loaded")]
    ModuleNotLoaded(String),

    /// Mount selector resolved to more than one element
    #[error("Target element \"{selector}\" matched {count} elements")]
    MountTargetAmbiguous { selector: String, count: usize },

    /// `initialize()` was invoked on a loader that already ran
    #[error("Module loader already initialized")]
    AlreadyInitialized,

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration or manifest file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileNotFound(String),

    /// Configuration file parse error
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Module manifest failed validation
    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (unexpected state)
    #[error("Internal error: {0}")]
    Internal(String),

    /// HTTP client failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<reqwest::Error> for OtoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OtoError::Http(format!("request timed out: {}", err))
        } else if err.is_connect() {
            OtoError::Http(format!("connection failed: {}", err))
        } else {
            OtoError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OtoError {
    fn from(err: serde_json::Error) -> Self {
        OtoError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for OtoError {
    fn from(err: std::io::Error) -> Self {
        OtoError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for OtoError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => OtoError::ConfigFileNotFound(path),
            config::ConfigError::FileParse { uri, cause } => OtoError::ConfigParseError(format!(
                "{}: {}",
                uri.unwrap_or_default(),
                cause
            )),
            other => OtoError::ConfigParseError(other.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for OtoError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        use crate::config::ConfigLoadError;
        match err {
            ConfigLoadError::Config(e) => e.into(),
            ConfigLoadError::MissingRequired(key) => OtoError::InvalidConfigValue {
                key,
                message: "value is required".to_string(),
            },
            ConfigLoadError::InvalidValue { key, message } => {
                OtoError::InvalidConfigValue { key, message }
            }
            ConfigLoadError::Io(e) => e.into(),
        }
    }
}

impl OtoError {
    /// Returns true if this error belongs to a single module's load or mount.
    pub fn is_module_error(&self) -> bool {
        matches!(
            self,
            OtoError::NotFound(_)
                | OtoError::FetchFailed { .. }
                | OtoError::NetworkError { .. }
                | OtoError::MountTargetMissing(_)
                | OtoError::ModuleNotLoaded(_)
                | OtoError::MountTargetAmbiguous { .. }
        )
    }

    /// Returns true if this error is related to configuration or the manifest.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OtoError::ConfigFileNotFound(_)
                | OtoError::ConfigParseError(_)
                | OtoError::InvalidConfigValue { .. }
                | OtoError::InvalidManifest(_)
        )
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            OtoError::NotFound(_) => "E1001",
            OtoError::FetchFailed { .. } => "E1002",
            OtoError::NetworkError { .. } => "E1003",
            OtoError::MountTargetMissing(_) => "E1004",
            OtoError::ModuleNotLoaded(_) => "E1005",
            OtoError::MountTargetAmbiguous { .. } => "E1006",
            OtoError::AlreadyInitialized => "E1007",
            OtoError::ConfigFileNotFound(_) => "E2001",
            OtoError::ConfigParseError(_) => "E2002",
            OtoError::InvalidConfigValue { .. } => "E2003",
            OtoError::InvalidManifest(_) => "E2004",
            OtoError::Internal(_) => "E9001",
            OtoError::Http(_) => "E9002",
            OtoError::IoError(_) => "E9003",
            OtoError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            OtoError::NotFound(_) => Some("Check the module name against config/modules.json"),
            OtoError::FetchFailed { .. } => {
                Some("Check that the module path exists under the asset root or base URL")
            }
            OtoError::NetworkError { .. } | OtoError::Http(_) => {
                Some("Check that the asset server is reachable")
            }
            OtoError::MountTargetMissing(_) => {
                Some("Add an element matching the module's target selector to the page template")
            }
            OtoError::MountTargetAmbiguous { .. } => {
                Some("Use a selector that matches exactly one element, such as an #id")
            }
            OtoError::ConfigFileNotFound(_) => {
                Some("Pass --manifest or set OTO_LOADER__MANIFEST_PATH")
            }
            OtoError::InvalidManifest(_) => Some("Run 'oto check' to list manifest problems"),
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_module_error() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Module error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

/// Result type alias for OTO operations.
pub type OtoResult<T> = Result<T, OtoError>;

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with its code and suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a OtoError,
    show_code: bool,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a OtoError) -> Self {
        Self {
            error,
            show_code: true,
            show_suggestion: true,
        }
    }

    pub fn without_code(mut self) -> Self {
        self.show_code = false;
        self
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.show_code {
            writeln!(f, "[{}] {}", self.error.error_code(), self.error)?;
        } else {
            writeln!(f, "{}", self.error)?;
        }

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}
