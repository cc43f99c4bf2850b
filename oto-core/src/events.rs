use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Critical,
    Complete,
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPhase::Critical => write!(f, "critical"),
            LoadPhase::Complete => write!(f, "complete"),
        }
    }
}

/// Emitted once a loading phase has mounted everything it could.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub phase: LoadPhase,
    pub succeeded: usize,
    pub failed: usize,
    pub timestamp: DateTime<Utc>,
}

impl PhaseEvent {
    pub fn new(phase: LoadPhase, succeeded: usize, failed: usize) -> Self {
        Self {
            phase,
            succeeded,
            failed,
            timestamp: Utc::now(),
        }
    }
}

pub type PhaseHandler = Arc<dyn Fn(PhaseEvent) + Send + Sync>;
