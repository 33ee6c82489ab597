//! Normalized-title deduplication against the current run and the
//! persisted problem store.

use std::collections::HashSet;
use std::sync::Arc;

use qharvest_core::{CollectedQuestion, ProblemStore};

/// Normalizes a title into its duplicate-detection key: lowercase, word
/// characters only (alphanumerics plus `_`).
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Rejects questions whose normalized title was already seen this run or
/// already exists in the persisted store.
///
/// The in-memory set is consulted first; the store scan is a linear pass
/// over `list_all` — acceptable while the data set stays small. A store
/// failure degrades the check to memory-only rather than propagating.
pub struct DuplicateChecker {
    store: Arc<dyn ProblemStore>,
    seen_titles: HashSet<String>,
}

impl DuplicateChecker {
    #[must_use]
    pub fn new(store: Arc<dyn ProblemStore>) -> Self {
        Self {
            store,
            seen_titles: HashSet::new(),
        }
    }

    /// True iff the question's normalized title matches one seen this run
    /// or one already persisted.
    pub async fn is_duplicate(&self, question: &CollectedQuestion) -> bool {
        let key = normalize_title(&question.title);
        if self.seen_titles.contains(&key) {
            return true;
        }

        match self.store.list_all().await {
            Ok(problems) => problems
                .iter()
                .any(|problem| normalize_title(&problem.title) == key),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "problem store unreachable — duplicate check degraded to memory only"
                );
                false
            }
        }
    }

    /// Records the question's normalized title in the in-memory set.
    /// Persisted storage is untouched; saving happens separately.
    pub fn mark_as_seen(&mut self, question: &CollectedQuestion) {
        self.seen_titles.insert(normalize_title(&question.title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use qharvest_core::{NewProblem, ProblemRecord, StoreError};

    struct FixedStore {
        titles: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl ProblemStore for FixedStore {
        async fn list_all(&self) -> Result<Vec<ProblemRecord>, StoreError> {
            if self.fail {
                return Err(StoreError("connection refused".to_string()));
            }
            Ok(self
                .titles
                .iter()
                .enumerate()
                .map(|(i, title)| ProblemRecord {
                    id: i64::try_from(i).unwrap_or(0),
                    title: (*title).to_string(),
                    content: String::new(),
                    category: "other".to_string(),
                    tags: Vec::new(),
                    related_book_ids: Vec::new(),
                })
                .collect())
        }

        async fn insert(&self, _problem: NewProblem) -> Result<i64, StoreError> {
            Err(StoreError("read-only test store".to_string()))
        }
    }

    fn question(title: &str) -> CollectedQuestion {
        CollectedQuestion::new(title, "", "zhihu")
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_title("股票 怎么 入门?");
        assert_eq!(normalize_title(&once), once);
    }

    #[test]
    fn normalization_ignores_punctuation_and_spacing() {
        assert_eq!(
            normalize_title("股票怎么入门？"),
            normalize_title("股票 怎么 入门?")
        );
        assert_eq!(normalize_title("How TO start?"), "howtostart");
    }

    #[tokio::test]
    async fn detects_duplicates_within_the_run() {
        let store = Arc::new(FixedStore { titles: vec![], fail: false });
        let mut checker = DuplicateChecker::new(store);

        let first = question("股票怎么入门？");
        assert!(!checker.is_duplicate(&first).await);
        checker.mark_as_seen(&first);

        let variant = question("股票 怎么 入门?");
        assert!(checker.is_duplicate(&variant).await);
    }

    #[tokio::test]
    async fn detects_duplicates_in_the_store() {
        let store = Arc::new(FixedStore {
            titles: vec!["股票怎么入门？"],
            fail: false,
        });
        let checker = DuplicateChecker::new(store);
        assert!(checker.is_duplicate(&question("股票 怎么 入门?")).await);
        assert!(!checker.is_duplicate(&question("基金怎么选？")).await);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_memory_only() {
        let store = Arc::new(FixedStore { titles: vec![], fail: true });
        let mut checker = DuplicateChecker::new(store);

        let q = question("股票怎么入门？");
        assert!(!checker.is_duplicate(&q).await);
        checker.mark_as_seen(&q);
        assert!(checker.is_duplicate(&q).await);
    }
}
