//! Domain types shared across the collection pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::CoreError;

/// A candidate question harvested from one source platform.
///
/// `tags`, `metadata`, and `answers` always start empty — never absent.
/// The processor cleans `title`/`content` in place; the service scores,
/// sorts, and truncates `answers` before the question is shaped for output
/// or handed to persistence.
#[derive(Debug, Clone, Serialize)]
pub struct CollectedQuestion {
    pub title: String,
    pub content: String,
    /// Platform slug the question came from, e.g. `zhihu`.
    pub source: String,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    /// Open bag of platform-specific attributes (hot rank, follower counts, ...).
    pub metadata: Map<String, Value>,
    pub answers: Vec<CollectedAnswer>,
}

impl CollectedQuestion {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: source.to_string(),
            source_url: None,
            author: None,
            created_at: None,
            tags: Vec::new(),
            metadata: Map::new(),
            answers: Vec::new(),
        }
    }
}

/// A candidate answer (or comment) attached to a [`CollectedQuestion`].
///
/// `quality_score` stays `0.0` until the answer scorer assigns a value in
/// `[0, 1]`.
#[derive(Debug, Clone, Serialize)]
pub struct CollectedAnswer {
    pub content: String,
    pub author: Option<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub source_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: Map<String, Value>,
    pub quality_score: f64,
}

impl CollectedAnswer {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: None,
            upvotes: 0,
            downvotes: 0,
            source_url: None,
            created_at: None,
            metadata: Map::new(),
            quality_score: 0.0,
        }
    }
}

/// Parameters for one collection run.
///
/// Built once per request by the service and passed by shared reference
/// through the manager and collectors.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// The search term driving the run. Non-empty after trimming.
    pub topic: String,
    pub max_results: usize,
    /// Restrict the run to one registered platform. `None` means all
    /// available platforms.
    pub platform: Option<String>,
    pub collect_answers: bool,
    pub max_answers_per_question: usize,
    pub min_answer_upvotes: u32,
    /// Extra filter conditions. Carried for custom collectors; unused by the
    /// built-in ones.
    pub filters: Map<String, Value>,
}

impl CollectionConfig {
    /// Builds a config with defaults for everything but the topic.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyTopic`] if `topic` is empty after trimming.
    pub fn new(topic: &str) -> Result<Self, CoreError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(CoreError::EmptyTopic);
        }
        Ok(Self {
            topic: topic.to_string(),
            max_results: 50,
            platform: None,
            collect_answers: true,
            max_answers_per_question: 3,
            min_answer_upvotes: 10,
            filters: Map::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_question_starts_with_empty_collections() {
        let q = CollectedQuestion::new("t", "c", "zhihu");
        assert!(q.tags.is_empty());
        assert!(q.metadata.is_empty());
        assert!(q.answers.is_empty());
        assert!(q.source_url.is_none());
    }

    #[test]
    fn new_answer_starts_unscored() {
        let a = CollectedAnswer::new("body");
        assert_eq!(a.quality_score, 0.0);
        assert_eq!(a.upvotes, 0);
    }

    #[test]
    fn config_trims_topic() {
        let cfg = CollectionConfig::new("  股票  ").unwrap();
        assert_eq!(cfg.topic, "股票");
        assert_eq!(cfg.max_results, 50);
    }

    #[test]
    fn config_rejects_empty_topic() {
        assert!(matches!(CollectionConfig::new("   "), Err(CoreError::EmptyTopic)));
        assert!(matches!(CollectionConfig::new(""), Err(CoreError::EmptyTopic)));
    }
}
