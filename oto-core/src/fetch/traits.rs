use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OtoResult;

/// Status and body of a completed `GET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, "")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves fragment markup by path.
///
/// A response with any status is `Ok`; `Err` is reserved for transport
/// failures where no response exists at all.
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, path: &str) -> OtoResult<FetchResponse>;
}
