pub mod fetcher;
pub mod guard;

pub use fetcher::ReqwestFetcher;
pub use guard::TargetGuard;
