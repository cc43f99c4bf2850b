mod file;
mod http;
mod traits;

pub use file::FileFetcher;
pub use http::HttpFetcher;
pub use traits::{FetchResponse, Fetcher};
