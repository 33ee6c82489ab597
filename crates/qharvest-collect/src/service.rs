//! Top-level collection facade.
//!
//! Builds the per-run config, drives the manager, scores and trims answers,
//! infers a coarse topic category, and (on request) persists surviving
//! questions and answers through the store interfaces.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use qharvest_core::{
    AnswerStore, AppConfig, CollectedQuestion, CollectionConfig, NewAnswer, NewProblem,
    ProblemStore,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::dedup::{normalize_title, DuplicateChecker};
use crate::error::CollectError;
use crate::manager::CollectorManager;
use crate::process::QuestionProcessor;
use crate::scorer::DefaultAnswerScorer;
use crate::sources::{
    presets, QuestionCollector, ThirdPartyCollector, WeiboCollector, WeixinHotCollector,
    ZhihuCollector,
};

/// Coarse topic categories by substring keyword. Unmatched topics land in
/// `other`.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("股票", "finance"),
    ("基金", "finance"),
    ("投资", "finance"),
    ("stock", "finance"),
    ("fund", "finance"),
    ("investment", "finance"),
    ("人工智能", "tech"),
    ("科技", "tech"),
    ("technology", "tech"),
    ("software", "tech"),
    ("文学", "literature"),
    ("literature", "literature"),
    ("历史", "history"),
    ("history", "history"),
    ("艺术", "art"),
    ("art", "art"),
];

fn guess_category(topic: &str) -> String {
    let topic_lower = topic.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| topic_lower.contains(keyword))
        .map_or_else(|| "other".to_string(), |(_, category)| (*category).to_string())
}

/// The topic joins the tag list exactly once.
fn merged_tags(tags: &[String], topic: &str) -> Vec<String> {
    let mut merged = tags.to_vec();
    if !merged.iter().any(|t| t == topic) {
        merged.push(topic.to_string());
    }
    merged
}

fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// One caller request, mirroring [`CollectionConfig`] plus the save switch.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub topic: String,
    pub max_results: usize,
    pub platform: Option<String>,
    pub auto_save: bool,
    pub collect_answers: bool,
    pub max_answers_per_question: usize,
    pub min_answer_upvotes: u32,
}

impl CollectRequest {
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_results: 50,
            platform: None,
            auto_save: false,
            collect_answers: true,
            max_answers_per_question: 3,
            min_answer_upvotes: 10,
        }
    }
}

/// The always-well-formed result of a run. `success` plus counts make
/// "nothing matched" distinguishable from a failed call (which surfaces as
/// an `Err` instead).
#[derive(Debug, Serialize)]
pub struct CollectionOutcome {
    pub success: bool,
    pub total_collected: usize,
    pub total_answers_collected: usize,
    pub saved: usize,
    pub saved_answers: usize,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Serialize)]
pub struct QuestionPayload {
    pub title: String,
    pub content: String,
    pub source: String,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub answers: Vec<AnswerPayload>,
    pub metadata: PayloadMetadata,
}

#[derive(Debug, Serialize)]
pub struct AnswerPayload {
    pub content: String,
    pub author: Option<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub quality_score: f64,
    pub source_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PayloadMetadata {
    pub collected_at: Option<DateTime<Utc>>,
    pub source_metadata: Map<String, Value>,
}

fn shape_question(question: &CollectedQuestion, topic: &str, category: &str) -> QuestionPayload {
    QuestionPayload {
        title: question.title.clone(),
        content: question.content.clone(),
        source: question.source.clone(),
        source_url: question.source_url.clone(),
        author: question.author.clone(),
        tags: merged_tags(&question.tags, topic),
        category: category.to_string(),
        answers: question
            .answers
            .iter()
            .map(|answer| AnswerPayload {
                content: answer.content.clone(),
                author: answer.author.clone(),
                upvotes: answer.upvotes,
                downvotes: answer.downvotes,
                quality_score: round3(answer.quality_score),
                source_url: answer.source_url.clone(),
            })
            .collect(),
        metadata: PayloadMetadata {
            collected_at: question.created_at,
            source_metadata: question.metadata.clone(),
        },
    }
}

pub struct CollectionService {
    manager: CollectorManager,
    scorer: DefaultAnswerScorer,
    problems: Arc<dyn ProblemStore>,
    answers: Arc<dyn AnswerStore>,
}

impl CollectionService {
    /// Wires the standard collector set from the application config.
    ///
    /// With `use_third_party` set, zhihu/weibo route through their juhe
    /// aggregator presets when the matching key is configured, falling back
    /// to the direct collectors otherwise. The hot-topic collector joins
    /// whenever its key is present.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if a collector's HTTP client cannot
    /// be built.
    pub fn new(
        config: &AppConfig,
        problems: Arc<dyn ProblemStore>,
        answers: Arc<dyn AnswerStore>,
    ) -> Result<Self, CollectError> {
        let mut manager = CollectorManager::new(
            Some(QuestionProcessor::standard()),
            Some(DuplicateChecker::new(problems.clone())),
        );

        let timeout = config.request_timeout_secs;
        let user_agent = config.user_agent.as_str();

        if config.use_third_party {
            if let Some(key) = &config.zhihu_juhe_api_key {
                tracing::info!(platform = "zhihu", "routing through juhe aggregator");
                manager.register_collector(Box::new(ThirdPartyCollector::new(
                    "zhihu",
                    presets::zhihu_juhe(key),
                    timeout,
                    user_agent,
                )?));
            } else {
                tracing::info!(platform = "zhihu", "no aggregator key — using direct API");
                manager.register_collector(Box::new(ZhihuCollector::new(timeout, user_agent)?));
            }

            if let Some(key) = &config.weibo_juhe_api_key {
                tracing::info!(platform = "weibo", "routing through juhe aggregator");
                manager.register_collector(Box::new(ThirdPartyCollector::new(
                    "weibo",
                    presets::weibo_juhe(key),
                    timeout,
                    user_agent,
                )?));
            } else {
                tracing::info!(platform = "weibo", "no aggregator key — using direct API");
                manager.register_collector(Box::new(WeiboCollector::new(
                    timeout,
                    user_agent,
                    config.weibo_access_token.clone(),
                )?));
            }
        } else {
            manager.register_collector(Box::new(ZhihuCollector::new(timeout, user_agent)?));
            manager.register_collector(Box::new(WeiboCollector::new(
                timeout,
                user_agent,
                config.weibo_access_token.clone(),
            )?));
        }

        let weixin = WeixinHotCollector::new(timeout, user_agent, config.juhe_api_key.clone())?;
        if weixin.is_available() {
            tracing::info!(platform = "weixin_hot", "hot-topic collector enabled");
            manager.register_collector(Box::new(weixin));
        }

        Ok(Self {
            manager,
            scorer: DefaultAnswerScorer::new(10),
            problems,
            answers,
        })
    }

    /// Assembles a service from pre-built parts — the seam used by tests
    /// and by callers bringing their own collectors.
    #[must_use]
    pub fn with_components(
        manager: CollectorManager,
        scorer: DefaultAnswerScorer,
        problems: Arc<dyn ProblemStore>,
        answers: Arc<dyn AnswerStore>,
    ) -> Self {
        Self {
            manager,
            scorer,
            problems,
            answers,
        }
    }

    #[must_use]
    pub fn available_platforms(&self) -> Vec<String> {
        self.manager.available_collectors()
    }

    #[must_use]
    pub fn all_platforms(&self) -> Vec<String> {
        self.manager.all_collectors()
    }

    /// Runs one collection pass end to end.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::InvalidConfig`] if the topic is empty after
    /// trimming — the only synchronous caller error. Everything below the
    /// service boundary is absorbed and logged; a run with no usable
    /// sources comes back as a successful empty outcome.
    pub async fn collect_questions(
        &mut self,
        request: CollectRequest,
    ) -> Result<CollectionOutcome, CollectError> {
        let mut config = CollectionConfig::new(&request.topic)?;
        config.max_results = request.max_results;
        config.platform = request.platform.clone();
        config.collect_answers = request.collect_answers;
        config.max_answers_per_question = request.max_answers_per_question;
        config.min_answer_upvotes = request.min_answer_upvotes;

        tracing::info!(
            topic = %config.topic,
            max_results = config.max_results,
            platform = config.platform.as_deref().unwrap_or("all"),
            "starting collection run"
        );

        let mut questions = self.manager.collect(&config).await;
        tracing::info!(count = questions.len(), "collection run finished");

        let mut total_answers = 0;
        if config.collect_answers {
            for question in &mut questions {
                if question.answers.is_empty() {
                    continue;
                }
                for answer in &mut question.answers {
                    answer.quality_score = self.scorer.score(answer);
                }
                // Quality first, upvotes as the tiebreak.
                question.answers.sort_by(|a, b| {
                    b.quality_score
                        .total_cmp(&a.quality_score)
                        .then_with(|| b.upvotes.cmp(&a.upvotes))
                });
                question.answers.truncate(config.max_answers_per_question);
                total_answers += question.answers.len();
            }
        }

        let category = guess_category(&config.topic);

        let (saved, saved_answers) = if request.auto_save && !questions.is_empty() {
            self.save_questions(&questions, &config.topic, &category)
                .await
        } else {
            (0, 0)
        };

        Ok(CollectionOutcome {
            success: true,
            total_collected: questions.len(),
            total_answers_collected: total_answers,
            saved,
            saved_answers,
            questions: questions
                .iter()
                .map(|q| shape_question(q, &config.topic, &category))
                .collect(),
        })
    }

    /// Persists each question and its retained answers, skipping titles the
    /// store already holds.
    ///
    /// The normalized-title re-check here is independent of the manager's
    /// duplicate gate: that one filters the working set, this one is the
    /// last line immediately before the write. Insert failures skip the
    /// offending item and keep going; the returned counts reflect only
    /// successful writes.
    async fn save_questions(
        &self,
        questions: &[CollectedQuestion],
        topic: &str,
        category: &str,
    ) -> (usize, usize) {
        let mut saved = 0;
        let mut saved_answers = 0;

        for question in questions {
            let key = normalize_title(&question.title);
            let existing = match self.problems.list_all().await {
                Ok(existing) => existing,
                Err(e) => {
                    tracing::warn!(
                        title = %question.title,
                        error = %e,
                        "duplicate re-check failed — skipping save for this question"
                    );
                    continue;
                }
            };
            if existing
                .iter()
                .any(|problem| normalize_title(&problem.title) == key)
            {
                tracing::debug!(title = %question.title, "already persisted — skipping");
                continue;
            }

            let problem = NewProblem {
                title: question.title.clone(),
                content: question.content.clone(),
                category: category.to_string(),
                tags: merged_tags(&question.tags, topic),
                related_book_ids: Vec::new(),
            };
            let problem_id = match self.problems.insert(problem).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(title = %question.title, error = %e, "problem insert failed");
                    continue;
                }
            };
            saved += 1;

            for answer in &question.answers {
                let new_answer = NewAnswer {
                    problem_id,
                    content: answer.content.clone(),
                    author: answer.author.clone(),
                    upvotes: answer.upvotes,
                    downvotes: answer.downvotes,
                    quality_score: answer.quality_score,
                    source_url: answer.source_url.clone(),
                };
                match self.answers.insert(new_answer).await {
                    Ok(_) => saved_answers += 1,
                    Err(e) => {
                        tracing::warn!(problem_id, error = %e, "answer insert failed");
                    }
                }
            }
        }

        (saved, saved_answers)
    }
}
