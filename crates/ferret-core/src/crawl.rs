use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::aggregate::RunAggregator;
use crate::error::AppError;
use crate::links;
use crate::models::{CrawlRequest, PageResult, RunResult, RunStats};
use crate::page::PageProcessor;
use crate::run_context::RunContext;
use crate::traits::{Fetcher, RunSink};

/// Tuning knobs that are not part of a run's request.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of fetches in flight.
    pub concurrency: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl CrawlConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Why a URL ended in the skipped state.
#[derive(Debug)]
pub enum SkipReason {
    AlreadyVisited,
    BudgetExhausted,
    FetchFailed(AppError),
    ParseFailed(AppError),
    /// The fetcher failed for a reason other than transport or parsing.
    Failed(AppError),
}

impl SkipReason {
    /// Classify an error returned by a [`Fetcher`].
    fn from_fetch_error(e: AppError) -> Self {
        if e.is_fetch_failure() {
            SkipReason::FetchFailed(e)
        } else if matches!(e, AppError::ParseError(_)) {
            SkipReason::ParseFailed(e)
        } else {
            SkipReason::Failed(e)
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyVisited => write!(f, "already visited"),
            SkipReason::BudgetExhausted => write!(f, "page budget exhausted"),
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            SkipReason::ParseFailed(e) => write!(f, "unusable document: {e}"),
            SkipReason::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Events emitted by the crawl controller for monitoring/logging.
#[derive(Debug)]
pub enum CrawlEvent<'a> {
    Started {
        run_name: &'a str,
        seeds: usize,
    },
    FetchStarted {
        url: &'a str,
    },
    PageCompleted {
        result: &'a PageResult,
    },
    PageSkipped {
        url: &'a str,
        reason: &'a SkipReason,
    },
    Cancelled {
        in_flight: usize,
    },
    Saved {
        run_id: i64,
    },
    Finished {
        stats: &'a RunStats,
        cancelled: bool,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::Started { run_name, seeds } => {
                tracing::info!(run = %run_name, %seeds, "Crawl started");
            }
            CrawlEvent::FetchStarted { url } => {
                tracing::debug!(%url, "Fetching");
            }
            CrawlEvent::PageCompleted { result } => {
                tracing::info!(url = %result.url, contacts = result.contacts.len(), "Page processed");
            }
            CrawlEvent::PageSkipped { url, reason } => match reason {
                SkipReason::FetchFailed(_)
                | SkipReason::ParseFailed(_)
                | SkipReason::Failed(_) => {
                    tracing::warn!(%url, %reason, "Page skipped");
                }
                _ => tracing::debug!(%url, %reason, "Page skipped"),
            },
            CrawlEvent::Cancelled { in_flight } => {
                tracing::info!(%in_flight, "Crawl cancelled, aborting in-flight fetches");
            }
            CrawlEvent::Saved { run_id } => {
                tracing::info!(%run_id, "Run saved");
            }
            CrawlEvent::Finished { stats, cancelled } => {
                tracing::info!(
                    processed = stats.pages_processed,
                    skipped = stats.pages_skipped,
                    fetch_errors = stats.fetch_errors,
                    %cancelled,
                    "Crawl finished"
                );
            }
        }
    }
}

/// Reporter that streams every completed page over a channel and logs the
/// rest through [`TracingCrawlReporter`].
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<PageResult>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PageResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CrawlReporter for ChannelReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        if let CrawlEvent::PageCompleted { result } = &event {
            // A dropped receiver only means nobody is watching any more.
            let _ = self.tx.send((*result).clone());
        }
        TracingCrawlReporter.report(event);
    }
}

enum PageOutcome {
    Completed {
        result: PageResult,
        links: Vec<String>,
    },
    Skipped {
        url: String,
        reason: SkipReason,
    },
}

/// Everything a page task needs, cloned out of the service per URL.
struct PageTask<F> {
    fetcher: F,
    processor: Arc<PageProcessor>,
    request: Arc<CrawlRequest>,
    ctx: Arc<RunContext>,
}

impl<F: Fetcher> PageTask<F> {
    /// Fetch, reserve budget, process and (in spider mode) discover links.
    async fn run(self, url: String) -> PageOutcome {
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                return PageOutcome::Skipped {
                    url,
                    reason: SkipReason::from_fetch_error(e),
                };
            }
        };

        if !self.ctx.try_reserve_page() {
            return PageOutcome::Skipped {
                url,
                reason: SkipReason::BudgetExhausted,
            };
        }

        let result = match self
            .processor
            .process(&page.final_url, &page.html, &self.request)
        {
            Ok(result) => result,
            Err(e) => {
                return PageOutcome::Skipped {
                    url,
                    reason: SkipReason::ParseFailed(e),
                };
            }
        };

        let links = if self.request.spider_mode {
            links::discover(&page.html, &page.final_url).unwrap_or_else(|e| {
                tracing::warn!(url = %page.final_url, error = %e, "Link discovery failed");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        PageOutcome::Completed { result, links }
    }
}

/// Drives a crawl run: schedules fetches, feeds pages through the
/// [`PageProcessor`] and hands the aggregated result to the sink.
///
/// Generic over the fetcher and the sink so tests run without network or
/// database.
pub struct CrawlService<F, S>
where
    F: Fetcher,
    S: RunSink,
{
    fetcher: F,
    sink: S,
    processor: Arc<PageProcessor>,
    config: CrawlConfig,
}

impl<F, S> CrawlService<F, S>
where
    F: Fetcher + 'static,
    S: RunSink,
{
    pub fn new(fetcher: F, sink: S, config: CrawlConfig) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            sink,
            processor: Arc::new(PageProcessor::new()?),
            config,
        })
    }

    /// Run a crawl to completion or cancellation.
    ///
    /// An invalid request fails before any fetch and never reaches the sink.
    /// Otherwise the (possibly partial) result is saved and returned.
    pub async fn run<R: CrawlReporter>(
        &self,
        request: CrawlRequest,
        cancel_token: CancellationToken,
        reporter: &R,
    ) -> Result<RunResult, AppError> {
        request.validate()?;

        reporter.report(CrawlEvent::Started {
            run_name: &request.run_name,
            seeds: request.seeds.len(),
        });

        let request = Arc::new(request);
        let ctx = Arc::new(RunContext::new(request.max_pages));
        let mut pending: VecDeque<String> = request.seeds.iter().cloned().collect();
        let mut in_flight = JoinSet::new();
        let mut aggregator = RunAggregator::new(request.run_name.clone());
        let mut cancelled = false;
        let concurrency = self.config.concurrency.max(1);

        loop {
            if cancel_token.is_cancelled() {
                cancelled = true;
                break;
            }

            while in_flight.len() < concurrency {
                let Some(url) = pending.pop_front() else {
                    break;
                };
                if let Some(reason) = admit(&ctx, &url) {
                    ctx.record_skip(false);
                    reporter.report(CrawlEvent::PageSkipped {
                        url: &url,
                        reason: &reason,
                    });
                    continue;
                }

                reporter.report(CrawlEvent::FetchStarted { url: &url });
                let task = PageTask {
                    fetcher: self.fetcher.clone(),
                    processor: Arc::clone(&self.processor),
                    request: Arc::clone(&request),
                    ctx: Arc::clone(&ctx),
                };
                in_flight.spawn(task.run(url));
            }

            if in_flight.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                () = cancel_token.cancelled() => {
                    cancelled = true;
                    break;
                }
                joined = in_flight.join_next() => joined,
            };

            match joined {
                Some(Ok(PageOutcome::Completed { result, links })) => {
                    reporter.report(CrawlEvent::PageCompleted { result: &result });
                    aggregator.push(&result);
                    pending.extend(links.into_iter().filter(|link| !ctx.is_visited(link)));
                }
                Some(Ok(PageOutcome::Skipped { url, reason })) => {
                    ctx.record_skip(matches!(reason, SkipReason::FetchFailed(_)));
                    reporter.report(CrawlEvent::PageSkipped {
                        url: &url,
                        reason: &reason,
                    });
                }
                Some(Err(e)) => {
                    ctx.record_skip(false);
                    tracing::error!(error = %e, "Page task failed");
                }
                None => {}
            }
        }

        if cancelled {
            reporter.report(CrawlEvent::Cancelled {
                in_flight: in_flight.len(),
            });
            in_flight.abort_all();
        }

        let run = aggregator.finish(ctx.stats(), cancelled);
        if let Some(run_id) = self.sink.save(&run).await? {
            reporter.report(CrawlEvent::Saved { run_id });
        }
        reporter.report(CrawlEvent::Finished {
            stats: &run.stats,
            cancelled,
        });

        Ok(run)
    }
}

/// Decide whether a pending URL may be fetched. Marks it visited if so.
fn admit(ctx: &RunContext, url: &str) -> Option<SkipReason> {
    // Once the budget is spent every further fetch would be discarded.
    if ctx.budget_exhausted() {
        return Some(SkipReason::BudgetExhausted);
    }
    if !ctx.mark_visited(url) {
        return Some(SkipReason::AlreadyVisited);
    }
    None
}
