//! Core library for assembling the OTO website from HTML fragments.
//!
//! A [`ModuleManifest`] names each fragment, where to fetch it and which
//! element it replaces. [`ModuleLoader`] fetches critical fragments in order,
//! lazy fragments concurrently, and mounts every success into a [`Document`].

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod fetch;
pub mod loader;
pub mod models;

pub use config::{get_config_dir, ConfigLoadError, LoaderConfig, LoggingConfig, OtoConfig};
pub use document::{Document, ElementRef, HtmlDocument, MemoryDocument};
pub use error::{CliErrorDisplay, OtoError, OtoResult};
pub use events::{LoadPhase, PhaseEvent, PhaseHandler};
pub use fetch::{FetchResponse, Fetcher, FileFetcher, HttpFetcher};
pub use loader::{LoaderState, ModuleLoader};
pub use models::{
    ErrorRecord, InitSummary, LoadOutcome, LoadResult, LoadedModule, ModuleConfig,
    ModuleManifest, Priority,
};
