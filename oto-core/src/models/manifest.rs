use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{OtoError, OtoResult};
use crate::fetch::Fetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    Lazy,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::Lazy => write!(f, "lazy"),
        }
    }
}

/// Static descriptor of one HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub path: String,
    pub target: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ModuleConfig {
    pub fn critical(
        name: impl Into<String>,
        path: impl Into<String>,
        target: impl Into<String>,
        order: i64,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            target: target.into(),
            priority: Priority::Critical,
            order: Some(order),
        }
    }

    pub fn lazy(name: impl Into<String>, path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            target: target.into(),
            priority: Priority::Lazy,
            order: None,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.priority == Priority::Critical
    }
}

/// The `{ "modules": [...] }` document describing a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub modules: Vec<ModuleConfig>,
}

impl ModuleManifest {
    pub const DEFAULT_PATH: &'static str = "config/modules.json";

    pub fn new(modules: Vec<ModuleConfig>) -> Self {
        Self { modules }
    }

    pub fn from_json(json: &str) -> OtoResult<Self> {
        serde_json::from_str(json).map_err(|e| OtoError::InvalidManifest(e.to_string()))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> OtoResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OtoError::ConfigFileNotFound(path.display().to_string())
            } else {
                OtoError::IoError(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        debug!(path = %path.display(), "Read module manifest");
        Self::from_json(&content)
    }

    /// Retrieves the manifest through the same collaborator that serves fragments.
    pub async fn fetch(fetcher: &dyn Fetcher, path: &str) -> OtoResult<Self> {
        let response = fetcher.get(path).await?;
        if !response.is_success() {
            return Err(OtoError::ConfigFileNotFound(format!(
                "{} (status {})",
                path, response.status
            )));
        }
        Self::from_json(&response.body)
    }

    pub fn to_json_pretty(&self) -> OtoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn find(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Critical modules in ascending `order`; ties keep manifest order.
    pub fn critical_modules(&self) -> Vec<&ModuleConfig> {
        let mut critical: Vec<&ModuleConfig> =
            self.modules.iter().filter(|m| m.is_critical()).collect();
        critical.sort_by_key(|m| m.order.unwrap_or(i64::MAX));
        critical
    }

    pub fn lazy_modules(&self) -> Vec<&ModuleConfig> {
        self.modules
            .iter()
            .filter(|m| m.priority == Priority::Lazy)
            .collect()
    }

    /// Every module in the order `initialize()` loads them.
    pub fn load_order(&self) -> Vec<&ModuleConfig> {
        let mut ordered = self.critical_modules();
        ordered.extend(self.lazy_modules());
        ordered
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns every problem found, empty when the manifest is usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for (index, module) in self.modules.iter().enumerate() {
            if module.name.trim().is_empty() {
                problems.push(format!("modules[{}]: name is empty", index));
            } else if !seen.insert(module.name.as_str()) {
                problems.push(format!("modules[{}]: duplicate name \"{}\"", index, module.name));
            }

            if module.path.trim().is_empty() {
                problems.push(format!("modules[{}] \"{}\": path is empty", index, module.name));
            }

            if module.target.trim().is_empty() {
                problems.push(format!("modules[{}] \"{}\": target is empty", index, module.name));
            }

            if module.is_critical() && module.order.is_none() {
                problems.push(format!(
                    "modules[{}] \"{}\": critical module has no order",
                    index, module.name
                ));
            }
        }

        problems
    }

    pub fn validate(&self) -> OtoResult<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(OtoError::InvalidManifest(problems.join("; ")))
        }
    }
}
