//! Remote sources.
//!
//! `add` accepts either a local path or an `http(s)://` URL. For URLs the
//! response body is streamed straight into [`Store::add`](crate::store::Store::add);
//! nothing is buffered here.

use crate::cancel::{CancelToken, CancellableReader, Cancelled};
use crate::config::FetchConfig;
use crate::store::StoreError;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub type Body = Box<dyn Read + Send + Sync>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {message}")]
    Request { url: String, message: String },
    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl From<FetchError> for StoreError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled(c) => StoreError::Cancelled(c),
            other => StoreError::SourceFetch(other.to_string()),
        }
    }
}

/// Whether `source` names a remote resource rather than a local file.
pub fn is_remote(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Issue a GET for `url` and hand back its body as a cancellable stream.
pub fn open(
    url: &str,
    config: &FetchConfig,
    cancel: &CancelToken,
) -> Result<CancellableReader<Body>, FetchError> {
    cancel.check()?;

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(&config.user_agent)
        .build();
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(e) => {
            return Err(FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            });
        }
    };
    if response.status() != 200 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    debug!(
        url,
        content_type = response.content_type(),
        length = response.header("content-length"),
        "fetching remote source"
    );
    Ok(CancellableReader::new(response.into_reader(), cancel.clone()))
}
