//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::crawl::{CrawlEvent, CrawlReporter};
use crate::error::AppError;
use crate::models::RunResult;
use crate::traits::{FetchedPage, Fetcher, RunSink};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum MockResponse {
    Page(FetchedPage),
    NetworkError(String),
    Unusable(String),
}

/// Mock fetcher serving canned pages by exact URL.
///
/// Unknown URLs fail with an HTTP 404 error. Every call is recorded.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url` without redirect.
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_redirect(url, url, html)
    }

    /// Serve `html` for `url` as if redirected to `final_url`.
    pub fn with_redirect(self, url: &str, final_url: &str, html: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            MockResponse::Page(FetchedPage::new(html, final_url)),
        );
        self
    }

    /// Fail every fetch of `url` with a network error.
    pub fn with_error(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::NetworkError(message.to_string()));
        self
    }

    /// Fail every fetch of `url` with a parse error, as a fetcher does for
    /// a body it cannot read as text.
    pub fn with_unusable(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::Unusable(message.to_string()));
        self
    }

    /// Sleep before answering for `url`.
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetched.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        self.fetched.lock().unwrap().push(url.to_string());

        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Page(page)) => Ok(page),
            Some(MockResponse::NetworkError(message)) => Err(AppError::NetworkError(message)),
            Some(MockResponse::Unusable(message)) => Err(AppError::ParseError(message)),
            None => Err(AppError::HttpError(format!("HTTP 404 for {url}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock sink that records saved runs.
#[derive(Clone, Default)]
pub struct MockSink {
    saved: Arc<Mutex<Vec<RunResult>>>,
    save_error: Arc<Mutex<Option<AppError>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink whose first save fails.
    pub fn with_error(error: AppError) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            save_error: Arc::new(Mutex::new(Some(error))),
        }
    }

    pub fn saved(&self) -> Vec<RunResult> {
        self.saved.lock().unwrap().clone()
    }
}

impl RunSink for MockSink {
    async fn save(&self, run: &RunResult) -> Result<Option<i64>, AppError> {
        if let Some(e) = self.save_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(run.clone());
        Ok(Some(saved.len() as i64))
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock reporter that records completed and skipped URLs and saved run ids.
#[derive(Clone, Default)]
pub struct MockReporter {
    completed: Arc<Mutex<Vec<String>>>,
    skipped: Arc<Mutex<Vec<String>>>,
    saved: Arc<Mutex<Vec<i64>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn skipped(&self) -> Vec<String> {
        self.skipped.lock().unwrap().clone()
    }

    pub fn saved_ids(&self) -> Vec<i64> {
        self.saved.lock().unwrap().clone()
    }
}

impl CrawlReporter for MockReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::PageCompleted { result } => {
                self.completed.lock().unwrap().push(result.url.clone());
            }
            CrawlEvent::PageSkipped { url, .. } => {
                self.skipped.lock().unwrap().push(url.to_string());
            }
            CrawlEvent::Saved { run_id } => {
                self.saved.lock().unwrap().push(run_id);
            }
            _ => {}
        }
    }
}
