use std::future::Future;

use crate::error::AppError;
use crate::models::RunResult;

/// A fetched document and the URL it was finally served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: String,
    /// Post-redirect URL. Used as the base for link resolution and as the
    /// page's reported URL.
    pub final_url: String,
}

impl FetchedPage {
    pub fn new(html: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            final_url: final_url.into(),
        }
    }
}

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}

/// Receives the result of a finished run.
pub trait RunSink: Send + Sync + Clone {
    /// Persist a run. Returns the stored run's id, or `None` if the sink
    /// keeps nothing.
    fn save(
        &self,
        run: &RunResult,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;
}

/// A no-op RunSink for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullSink;

impl RunSink for NullSink {
    async fn save(&self, _run: &RunResult) -> Result<Option<i64>, AppError> {
        Ok(None)
    }
}
