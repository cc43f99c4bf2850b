use anyhow::{Context, Result};
use clap::Args;
use oto_core::{FileFetcher, Fetcher, HttpFetcher, ModuleManifest, OtoConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Where a site's manifest and fragments are served from.
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    #[arg(short, long, help = "Manifest path, relative to the site root")]
    pub manifest: Option<String>,

    #[arg(long, help = "Serve files from this directory")]
    pub root: Option<PathBuf>,

    #[arg(long, conflicts_with = "root", help = "Fetch files from this URL")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSource {
    Directory(PathBuf),
    Remote(String),
}

impl std::fmt::Display for SiteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteSource::Directory(path) => write!(f, "{}", path.display()),
            SiteSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Command-line flags merged over the loaded configuration.
#[derive(Debug, Clone)]
pub struct Site {
    pub manifest_path: String,
    pub source: SiteSource,
}

impl Site {
    pub fn resolve(args: &SiteArgs, config: &OtoConfig) -> Self {
        let manifest_path = args
            .manifest
            .clone()
            .unwrap_or_else(|| config.loader.manifest_path.clone());

        let source = match (&args.base_url, &args.root) {
            (Some(url), _) => SiteSource::Remote(url.clone()),
            (None, Some(root)) => SiteSource::Directory(root.clone()),
            (None, None) if config.uses_http() => {
                SiteSource::Remote(config.loader.base_url.clone())
            }
            (None, None) => SiteSource::Directory(PathBuf::from(&config.loader.root_dir)),
        };

        Self {
            manifest_path,
            source,
        }
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        match &self.source {
            SiteSource::Directory(root) => Arc::new(FileFetcher::new(root.clone())),
            SiteSource::Remote(url) => Arc::new(HttpFetcher::new(url.clone())),
        }
    }

    pub async fn load_manifest(&self, fetcher: &dyn Fetcher) -> Result<ModuleManifest> {
        let manifest = ModuleManifest::fetch(fetcher, &self.manifest_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to load manifest {} from {}",
                    self.manifest_path, self.source
                )
            })?;

        debug!(
            source = %self.source,
            fetcher = %fetcher.name(),
            modules = manifest.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }
}
