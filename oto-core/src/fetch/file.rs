use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::OtoResult;

use super::traits::{FetchResponse, Fetcher};

/// Serves fragments from a directory on disk, answering like a static file
/// server: 404 for missing files, 403 for paths that leave the root.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the root; `None` if it escapes the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.split(['?', '#']).next().unwrap_or_default();
        let mut resolved = self.root.clone();

        for component in Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(resolved)
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, path: &str) -> OtoResult<FetchResponse> {
        let Some(file) = self.resolve(path) else {
            debug!(path = %path, "Rejected path outside fragment root");
            return Ok(FetchResponse::new(403, ""));
        };

        match tokio::fs::read_to_string(&file).await {
            Ok(body) => {
                debug!(file = %file.display(), bytes = body.len(), "Read fragment");
                Ok(FetchResponse::ok(body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %file.display(), "Fragment file not found");
                Ok(FetchResponse::not_found())
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Ok(FetchResponse::new(403, ""))
            }
            Err(e) => Err(e.into()),
        }
    }
}
