use std::time::Duration;

use ferret_core::error::AppError;
use ferret_core::traits::{FetchedPage, Fetcher};
use reqwest::{Client, Response, StatusCode, header, redirect};
use url::Url;

use crate::guard::TargetGuard;

/// Redirect hops followed before a fetch is abandoned.
const MAX_REDIRECTS: usize = 10;

/// HTTP fetcher using reqwest.
///
/// Redirects are followed by hand so that every hop passes the
/// [`TargetGuard`] before it is requested. Reserved address ranges are
/// refused unless [`allow_private_urls`](Self::allow_private_urls) or
/// [`trust_host`](Self::trust_host) say otherwise.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
    guard: TargetGuard,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("ferret/0.1 (contact crawler)")
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
            guard: TargetGuard::new(),
        })
    }

    /// Allow requests to private/reserved IPs (e.g. crawling an intranet).
    pub fn allow_private_urls(mut self) -> Self {
        self.guard = self.guard.allow_private();
        self
    }

    /// Allow one host even if it resolves to a reserved address.
    pub fn trust_host(mut self, host: impl Into<String>) -> Self {
        self.guard = self.guard.trust_host(host);
        self
    }

    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }

    /// Request `start` and follow redirects, checking each target first.
    async fn follow(&self, start: &str) -> Result<(Url, Response), AppError> {
        let mut current =
            Url::parse(start).map_err(|e| AppError::HttpError(format!("Invalid URL {start}: {e}")))?;

        for _ in 0..=MAX_REDIRECTS {
            self.guard.check(&current).await?;

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            match redirect_target(&current, &response)? {
                Some(next) => {
                    tracing::debug!(from = %current, to = %next, "Following redirect");
                    current = next;
                }
                None => return Ok((current, response)),
            }
        }

        Err(AppError::HttpError(format!(
            "Too many redirects (more than {MAX_REDIRECTS}) from {start}"
        )))
    }
}

/// The absolute URL a redirect response points to, if it is one.
fn redirect_target(current: &Url, response: &Response) -> Result<Option<Url>, AppError> {
    if !is_followed_redirect(response.status()) {
        return Ok(None);
    }
    let location = response
        .headers()
        .get(header::LOCATION)
        .ok_or_else(|| AppError::HttpError(format!("Redirect from {current} without Location")))?
        .to_str()
        .map_err(|e| AppError::HttpError(format!("Unreadable Location from {current}: {e}")))?;
    current
        .join(location)
        .map(Some)
        .map_err(|e| AppError::HttpError(format!("Bad redirect target {location:?}: {e}")))
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let (final_url, response) = self.follow(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                final_url
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        tracing::debug!(%url, %final_url, bytes = html.len(), "Fetched page");
        Ok(FetchedPage {
            html,
            final_url: final_url.to_string(),
        })
    }
}
