pub mod aggregate;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod links;
pub mod models;
pub mod page;
pub mod patterns;
pub mod phone;
pub mod proximity;
pub mod region;
pub mod run_context;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use crawl::{
    ChannelReporter, CrawlConfig, CrawlEvent, CrawlReporter, CrawlService, SkipReason,
    TracingCrawlReporter,
};
pub use error::AppError;
pub use models::{
    Anchor, AnchorSet, ContactRecord, CrawlRequest, Field, FieldSet, PageResult, RunResult,
    RunStats, SourcedContact,
};
pub use region::Region;
pub use traits::{FetchedPage, Fetcher, NullSink, RunSink};
