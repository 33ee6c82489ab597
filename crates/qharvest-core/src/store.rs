//! The narrow interface the collection subsystem consumes from the
//! persisted problem/answer store.
//!
//! The duplicate checker reads `list_all`; the service reads `list_all` and
//! writes `insert`. Nothing else of the store is visible from here — the
//! concrete sqlite implementation lives in `qharvest-db`.

use async_trait::async_trait;
use thiserror::Error;

/// A problem row as the external store returns it.
#[derive(Debug, Clone)]
pub struct ProblemRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub related_book_ids: Vec<i64>,
}

/// A problem about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub related_book_ids: Vec<i64>,
}

/// An answer about to be inserted, referencing its parent problem.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub problem_id: i64,
    pub content: String,
    pub author: Option<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub quality_score: f64,
    pub source_url: Option<String>,
}

/// Failure at the store boundary.
///
/// Callers in the collection subsystem treat this as a degraded-mode signal
/// (memory-only dedup, skipped save), never as a run-aborting fault.
#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Returns every persisted problem.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or the query fails.
    async fn list_all(&self) -> Result<Vec<ProblemRecord>, StoreError>;

    /// Inserts a problem and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn insert(&self, problem: NewProblem) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Inserts an answer and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    async fn insert(&self, answer: NewAnswer) -> Result<i64, StoreError>;
}
