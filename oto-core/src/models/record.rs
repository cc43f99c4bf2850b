use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manifest::ModuleConfig;
use crate::error::OtoError;

/// A fetched fragment held in the loader's registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedModule {
    pub html: String,
    pub config: ModuleConfig,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModule {
    pub fn new(html: String, config: ModuleConfig) -> Self {
        Self {
            html,
            config,
            loaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { html: String },
    Failed { error: String },
}

/// Outcome of one load attempt, consumed by the mounting step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: LoadOutcome,
}

impl LoadResult {
    pub fn loaded(name: impl Into<String>, html: String) -> Self {
        Self {
            name: name.into(),
            outcome: LoadOutcome::Loaded { html },
        }
    }

    pub fn failed(name: impl Into<String>, error: &OtoError) -> Self {
        Self {
            name: name.into(),
            outcome: LoadOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded { .. })
    }

    pub fn html(&self) -> Option<&str> {
        match &self.outcome {
            LoadOutcome::Loaded { html } => Some(html),
            LoadOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            LoadOutcome::Loaded { .. } => None,
            LoadOutcome::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub module: String,
    pub error: String,
}

impl ErrorRecord {
    pub fn new(module: impl Into<String>, error: &OtoError) -> Self {
        Self {
            module: module.into(),
            error: error.to_string(),
        }
    }
}

/// What `initialize()` reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSummary {
    pub success: bool,
    pub critical_count: usize,
    pub lazy_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub errors: Vec<ErrorRecord>,
}

impl InitSummary {
    pub fn completed(critical_count: usize, lazy_count: usize, errors: Vec<ErrorRecord>) -> Self {
        Self {
            success: true,
            critical_count,
            lazy_count,
            error: None,
            errors,
        }
    }

    pub fn aborted(error: &OtoError, errors: Vec<ErrorRecord>) -> Self {
        Self {
            success: false,
            critical_count: 0,
            lazy_count: 0,
            error: Some(error.to_string()),
            errors,
        }
    }

    /// True when orchestration finished and no module recorded an error.
    pub fn is_clean(&self) -> bool {
        self.success && self.errors.is_empty()
    }
}
