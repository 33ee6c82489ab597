//! Question collection subsystem for qharvest.
//!
//! Pluggable per-platform collectors gather candidate questions (optionally
//! with answers), a processor cleans and filters them, a duplicate checker
//! drops titles already seen or persisted, and a service facade scores
//! answers, infers a category, and optionally saves everything through the
//! narrow store interface in `qharvest-core`.

pub mod dedup;
pub mod error;
pub mod fetch;
pub mod manager;
pub mod process;
pub mod rate_limit;
pub mod scorer;
pub mod service;
pub mod sources;

mod text;

pub use dedup::DuplicateChecker;
pub use error::CollectError;
pub use fetch::{FetchClient, FetchResponse};
pub use manager::CollectorManager;
pub use process::{ContentQualityFilter, MinLengthFilter, QuestionFilter, QuestionProcessor};
pub use rate_limit::RateLimiter;
pub use scorer::DefaultAnswerScorer;
pub use service::{CollectRequest, CollectionOutcome, CollectionService};
pub use sources::QuestionCollector;
