mod manifest;
mod record;

pub use manifest::{ModuleConfig, ModuleManifest, Priority};
pub use record::{ErrorRecord, InitSummary, LoadOutcome, LoadResult, LoadedModule};
