//! Fan-out across registered collectors plus shared processing and
//! deduplication.

use qharvest_core::{CollectedQuestion, CollectionConfig};

use crate::dedup::DuplicateChecker;
use crate::process::QuestionProcessor;
use crate::sources::QuestionCollector;

/// Owns the registered collectors and runs them in registration order,
/// then applies the processor, the duplicate checker, and the result cap.
///
/// A collector that fails is logged and skipped; partial results from the
/// remaining collectors still come back.
pub struct CollectorManager {
    collectors: Vec<Box<dyn QuestionCollector>>,
    processor: Option<QuestionProcessor>,
    duplicate_checker: Option<DuplicateChecker>,
}

impl CollectorManager {
    #[must_use]
    pub fn new(
        processor: Option<QuestionProcessor>,
        duplicate_checker: Option<DuplicateChecker>,
    ) -> Self {
        Self {
            collectors: Vec::new(),
            processor,
            duplicate_checker,
        }
    }

    /// Registers a collector under its platform slug. Registering the same
    /// slug again replaces the earlier collector in place, keeping its
    /// position in the execution order.
    pub fn register_collector(&mut self, collector: Box<dyn QuestionCollector>) {
        let name = collector.platform_name();
        if let Some(existing) = self
            .collectors
            .iter_mut()
            .find(|c| c.platform_name() == name)
        {
            *existing = collector;
        } else {
            self.collectors.push(collector);
        }
    }

    /// Platform slugs of collectors whose `is_available` is true, in
    /// registration order.
    #[must_use]
    pub fn available_collectors(&self) -> Vec<String> {
        self.collectors
            .iter()
            .filter(|c| c.is_available())
            .map(|c| c.platform_name().to_string())
            .collect()
    }

    /// Platform slugs of every registered collector, in registration order.
    #[must_use]
    pub fn all_collectors(&self) -> Vec<String> {
        self.collectors
            .iter()
            .map(|c| c.platform_name().to_string())
            .collect()
    }

    /// Runs the selected collectors sequentially and pipes the aggregate
    /// through processing, deduplication, and the `max_results` cap.
    ///
    /// Selection: a named platform is used alone, and only if it is
    /// registered and available — a named-but-unavailable or unknown
    /// platform selects nothing rather than silently falling back to all.
    pub async fn collect(&mut self, config: &CollectionConfig) -> Vec<CollectedQuestion> {
        let selected: Vec<usize> = match &config.platform {
            Some(platform) => self
                .collectors
                .iter()
                .enumerate()
                .filter(|(_, c)| c.platform_name() == platform.as_str() && c.is_available())
                .map(|(i, _)| i)
                .collect(),
            None => self
                .collectors
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_available())
                .map(|(i, _)| i)
                .collect(),
        };

        let mut all_questions = Vec::new();
        for index in selected {
            let collector = &self.collectors[index];
            match collector.collect(config).await {
                Ok(questions) => {
                    tracing::debug!(
                        platform = collector.platform_name(),
                        count = questions.len(),
                        "collector finished"
                    );
                    all_questions.extend(questions);
                }
                Err(e) => {
                    tracing::warn!(
                        platform = collector.platform_name(),
                        error = %e,
                        "collector failed — continuing with the rest"
                    );
                }
            }
        }

        if let Some(processor) = &self.processor {
            all_questions = processor.process(all_questions);
        }

        if let Some(checker) = &mut self.duplicate_checker {
            let mut unique = Vec::with_capacity(all_questions.len());
            for question in all_questions {
                if !checker.is_duplicate(&question).await {
                    checker.mark_as_seen(&question);
                    unique.push(question);
                }
            }
            all_questions = unique;
        }

        all_questions.truncate(config.max_results);
        all_questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::CollectError;
    use qharvest_core::{NewProblem, ProblemRecord, ProblemStore, StoreError};

    /// A scripted collector: fixed name/availability, fixed titles or a
    /// scripted failure.
    struct ScriptedCollector {
        name: &'static str,
        available: bool,
        titles: Vec<&'static str>,
        fail: bool,
    }

    impl ScriptedCollector {
        fn ok(name: &'static str, titles: Vec<&'static str>) -> Box<Self> {
            Box::new(Self { name, available: true, titles, fail: false })
        }

        fn unavailable(name: &'static str) -> Box<Self> {
            Box::new(Self { name, available: false, titles: vec![], fail: false })
        }

        fn failing(name: &'static str) -> Box<Self> {
            Box::new(Self { name, available: true, titles: vec![], fail: true })
        }
    }

    #[async_trait]
    impl QuestionCollector for ScriptedCollector {
        fn platform_name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn collect(
            &self,
            config: &CollectionConfig,
        ) -> Result<Vec<CollectedQuestion>, CollectError> {
            if self.fail {
                return Err(CollectError::Api {
                    platform: self.name.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(self
                .titles
                .iter()
                .map(|title| {
                    let mut q = CollectedQuestion::new(*title, "内容", self.name);
                    q.tags = vec![config.topic.clone()];
                    q
                })
                .collect())
        }
    }

    struct EmptyStore;

    #[async_trait]
    impl ProblemStore for EmptyStore {
        async fn list_all(&self) -> Result<Vec<ProblemRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert(&self, _problem: NewProblem) -> Result<i64, StoreError> {
            Err(StoreError("read-only test store".to_string()))
        }
    }

    fn config(topic: &str, max_results: usize) -> CollectionConfig {
        let mut c = CollectionConfig::new(topic).unwrap();
        c.max_results = max_results;
        c
    }

    #[tokio::test]
    async fn one_failing_collector_does_not_sink_the_others() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok("a", vec!["甲问题？"]));
        manager.register_collector(ScriptedCollector::failing("b"));
        manager.register_collector(ScriptedCollector::ok("c", vec!["丙问题？"]));

        let results = manager.collect(&config("题", 10)).await;
        let sources: Vec<_> = results.iter().map(|q| q.source.clone()).collect();
        assert_eq!(sources, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn named_unavailable_platform_selects_nothing() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok("a", vec!["甲问题？"]));
        manager.register_collector(ScriptedCollector::unavailable("b"));

        let mut cfg = config("题", 10);
        cfg.platform = Some("b".to_string());
        assert!(manager.collect(&cfg).await.is_empty());

        cfg.platform = Some("nonexistent".to_string());
        assert!(manager.collect(&cfg).await.is_empty());
    }

    #[tokio::test]
    async fn named_available_platform_runs_alone() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok("a", vec!["甲问题？"]));
        manager.register_collector(ScriptedCollector::ok("b", vec!["乙问题？"]));

        let mut cfg = config("题", 10);
        cfg.platform = Some("b".to_string());
        let results = manager.collect(&cfg).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "b");
    }

    #[tokio::test]
    async fn aggregation_keeps_registration_order_and_caps() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok(
            "a",
            vec!["a一？", "a二？", "a三？", "a四？"],
        ));
        manager.register_collector(ScriptedCollector::ok(
            "b",
            vec!["b一？", "b二？", "b三？", "b四？"],
        ));

        let results = manager.collect(&config("题", 5)).await;
        assert_eq!(results.len(), 5);
        let sources: Vec<_> = results.iter().map(|q| q.source.clone()).collect();
        assert_eq!(sources, vec!["a", "a", "a", "a", "b"]);
    }

    #[tokio::test]
    async fn duplicate_checker_drops_repeat_titles_across_collectors() {
        let checker = DuplicateChecker::new(Arc::new(EmptyStore));
        let mut manager = CollectorManager::new(None, Some(checker));
        manager.register_collector(ScriptedCollector::ok("a", vec!["股票怎么入门？"]));
        manager.register_collector(ScriptedCollector::ok("b", vec!["股票 怎么 入门?"]));

        let results = manager.collect(&config("股票", 10)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "a");
    }

    #[tokio::test]
    async fn introspection_reflects_availability() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok("a", vec![]));
        manager.register_collector(ScriptedCollector::unavailable("b"));

        assert_eq!(manager.all_collectors(), vec!["a", "b"]);
        assert_eq!(manager.available_collectors(), vec!["a"]);
    }

    #[tokio::test]
    async fn re_registering_a_slug_replaces_in_place() {
        let mut manager = CollectorManager::new(None, None);
        manager.register_collector(ScriptedCollector::ok("a", vec!["旧的？"]));
        manager.register_collector(ScriptedCollector::ok("b", vec!["乙的？"]));
        manager.register_collector(ScriptedCollector::ok("a", vec!["新的？"]));

        assert_eq!(manager.all_collectors(), vec!["a", "b"]);
        let results = manager.collect(&config("题", 10)).await;
        assert_eq!(results[0].title, "新的？");
    }
}
