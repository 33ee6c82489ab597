//! Zhihu collector: public search API → per-question detail → optional
//! answer harvest.

use std::collections::HashSet;

use async_trait::async_trait;
use qharvest_core::{CollectedAnswer, CollectedQuestion, CollectionConfig};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CollectError;
use crate::fetch::FetchClient;
use crate::rate_limit::RateLimiter;
use crate::text::clean_html_fragment;

use super::helpers::{count_u32, epoch_secs_or_now, finalize_answers, json_id_string};
use super::QuestionCollector;

const PLATFORM: &str = "zhihu";
const CANONICAL_URL: &str = "https://www.zhihu.com";
// Zhihu throttles aggressively per IP; keep well under one request a second.
const REQUESTS_PER_SECOND: f64 = 0.3;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    object: Option<SearchObject>,
}

/// A search result object. `type` is `question` for direct hits; answers
/// carry their parent question nested under `question`.
#[derive(Debug, Clone, Default, Deserialize)]
struct SearchObject {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    question: Option<Box<SearchObject>>,
}

#[derive(Debug, Deserialize)]
struct QuestionDetail {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    answer_count: Option<i64>,
    #[serde(default)]
    follower_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AnswerListing {
    #[serde(default)]
    data: Vec<AnswerData>,
}

#[derive(Debug, Deserialize)]
struct AnswerData {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    voteup_count: Option<i64>,
    #[serde(default)]
    votedown_count: Option<i64>,
    #[serde(default)]
    comment_count: Option<i64>,
    #[serde(default)]
    created_time: Option<i64>,
    #[serde(default)]
    author: Option<AnswerAuthor>,
}

#[derive(Debug, Deserialize)]
struct AnswerAuthor {
    #[serde(default)]
    name: Option<String>,
}

pub struct ZhihuCollector {
    http: FetchClient,
    limiter: RateLimiter,
    base_url: String,
}

impl ZhihuCollector {
    /// Creates a collector against the production zhihu API.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, CollectError> {
        Self::with_base_url(timeout_secs, user_agent, CANONICAL_URL)
    }

    /// Creates a collector with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CollectError> {
        let http = FetchClient::new(
            timeout_secs,
            &[
                ("user-agent", user_agent),
                ("accept", "application/json, text/plain, */*"),
                ("accept-language", "zh-CN,zh;q=0.9"),
                ("referer", "https://www.zhihu.com/"),
            ],
        )?;
        Ok(Self {
            http,
            limiter: RateLimiter::new(REQUESTS_PER_SECOND),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search_candidates(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<(String, SearchObject)>, CollectError> {
        self.limiter.wait_if_needed().await;

        let limit = config.max_results.saturating_mul(2).min(50);
        let params = [
            ("q", config.topic.clone()),
            ("t", "general".to_string()),
            ("correction", "1".to_string()),
            ("offset", "0".to_string()),
            ("limit", limit.to_string()),
            ("lc_idx", "0".to_string()),
            ("show_all_topics", "0".to_string()),
        ];
        let url = format!("{}/api/v4/search_v3", self.base_url);
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let search: SearchResponse = response.json("zhihu search")?;

        // Question hits in result order; answer hits contribute their parent
        // question. Ids are deduplicated while preserving first appearance.
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for hit in search.data {
            let Some(object) = hit.object else { continue };
            let question_obj = if object.kind == "question" {
                Some(object)
            } else if object.kind == "answer" {
                object.question.map(|q| *q)
            } else {
                None
            };
            let Some(question_obj) = question_obj else { continue };
            let Some(id) = question_obj.id.as_ref().and_then(json_id_string) else {
                continue;
            };
            if candidates.len() < config.max_results && seen.insert(id.clone()) {
                candidates.push((id, question_obj));
            }
        }
        Ok(candidates)
    }

    async fn question_with_detail(
        &self,
        question_id: &str,
        fallback: &SearchObject,
        config: &CollectionConfig,
    ) -> Result<CollectedQuestion, CollectError> {
        self.limiter.wait_if_needed().await;

        let url = format!("{}/api/v4/questions/{question_id}", self.base_url);
        let response = self.http.get(&url, &[], &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let detail: QuestionDetail = response.json("zhihu question detail")?;

        let answers = if config.collect_answers {
            self.collect_answers(question_id, config).await
        } else {
            Vec::new()
        };

        let title = detail
            .title
            .or_else(|| fallback.title.clone())
            .unwrap_or_default();
        let content = detail
            .detail
            .or_else(|| fallback.excerpt.clone())
            .unwrap_or_default();

        let mut question = CollectedQuestion::new(title, content, PLATFORM);
        question.source_url = Some(format!("{CANONICAL_URL}/question/{question_id}"));
        question.created_at = Some(epoch_secs_or_now(detail.created));
        question.tags = vec![config.topic.clone()];
        question
            .metadata
            .insert("zhihu_id".to_string(), json!(question_id));
        question.metadata.insert(
            "answer_count".to_string(),
            json!(detail.answer_count.unwrap_or(0)),
        );
        question.metadata.insert(
            "follower_count".to_string(),
            json!(detail.follower_count.unwrap_or(0)),
        );
        question.answers = answers;
        Ok(question)
    }

    /// Shapes a question from search-result fields alone, used when the
    /// detail fetch fails.
    fn question_from_search(
        question_id: &str,
        fallback: &SearchObject,
        config: &CollectionConfig,
    ) -> CollectedQuestion {
        let mut question = CollectedQuestion::new(
            fallback.title.clone().unwrap_or_default(),
            fallback.excerpt.clone().unwrap_or_default(),
            PLATFORM,
        );
        question.source_url = Some(format!("{CANONICAL_URL}/question/{question_id}"));
        question.created_at = Some(epoch_secs_or_now(None));
        question.tags = vec![config.topic.clone()];
        question
            .metadata
            .insert("zhihu_id".to_string(), json!(question_id));
        question
    }

    /// Harvests answers for one question, absorbing failures into an empty
    /// list so a bad answer listing never costs us the question itself.
    async fn collect_answers(
        &self,
        question_id: &str,
        config: &CollectionConfig,
    ) -> Vec<CollectedAnswer> {
        match self.fetch_answers(question_id, config).await {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!(
                    platform = PLATFORM,
                    question_id = %question_id,
                    error = %e,
                    "answer harvest failed"
                );
                Vec::new()
            }
        }
    }

    async fn fetch_answers(
        &self,
        question_id: &str,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedAnswer>, CollectError> {
        self.limiter.wait_if_needed().await;

        let url = format!("{}/api/v4/questions/{question_id}/answers", self.base_url);
        // Over-fetch relative to the cap so the upvote filter has room to work.
        let limit = config.max_answers_per_question.saturating_mul(3).min(20);
        let params = [
            (
                "include",
                "data[*].content,voteup_count,votedown_count,comment_count,created_time".to_string(),
            ),
            ("limit", limit.to_string()),
            ("offset", "0".to_string()),
            ("platform", "desktop".to_string()),
            ("sort_by", "default".to_string()),
        ];
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let listing: AnswerListing = response.json("zhihu answers")?;

        let mut answers = Vec::new();
        for data in listing.data {
            let upvotes = count_u32(data.voteup_count);
            if upvotes < config.min_answer_upvotes {
                continue;
            }
            let content = data
                .content
                .as_deref()
                .map(clean_html_fragment)
                .unwrap_or_default();
            if content.is_empty() {
                continue;
            }

            let mut answer = CollectedAnswer::new(content);
            answer.author = data.author.and_then(|a| a.name).filter(|n| !n.is_empty());
            answer.upvotes = upvotes;
            answer.downvotes = count_u32(data.votedown_count);
            answer.created_at = Some(epoch_secs_or_now(data.created_time));
            if let Some(answer_id) = data.id.as_ref().and_then(json_id_string) {
                answer.source_url = Some(format!("{CANONICAL_URL}/answer/{answer_id}"));
                answer
                    .metadata
                    .insert("zhihu_answer_id".to_string(), json!(answer_id));
            }
            answer.metadata.insert(
                "comment_count".to_string(),
                json!(data.comment_count.unwrap_or(0)),
            );
            answers.push(answer);
        }

        Ok(finalize_answers(answers, config))
    }
}

#[async_trait]
impl QuestionCollector for ZhihuCollector {
    fn platform_name(&self) -> &str {
        PLATFORM
    }

    fn is_available(&self) -> bool {
        // The search and question endpoints are public; no credentials.
        true
    }

    async fn collect(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError> {
        let candidates = self.search_candidates(config).await?;
        tracing::debug!(
            platform = PLATFORM,
            candidates = candidates.len(),
            "extracted unique question candidates"
        );

        let mut questions = Vec::new();
        for (question_id, fallback) in candidates {
            match self
                .question_with_detail(&question_id, &fallback, config)
                .await
            {
                Ok(question) => questions.push(question),
                Err(e) => {
                    tracing::warn!(
                        platform = PLATFORM,
                        question_id = %question_id,
                        error = %e,
                        "detail fetch failed — falling back to search result fields"
                    );
                    questions.push(Self::question_from_search(&question_id, &fallback, config));
                }
            }
        }

        tracing::debug!(platform = PLATFORM, count = questions.len(), "collected questions");
        Ok(questions)
    }
}
