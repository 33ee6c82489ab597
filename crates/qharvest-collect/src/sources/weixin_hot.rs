//! Weixin hot-topic feed collector, backed by the juhe aggregator API.
//!
//! The feed returns whatever is trending right now, not search results for
//! the topic. Items whose hot word matches the topic lead the output; the
//! rest pad it up to `max_results` so a run never comes back empty just
//! because nothing trending matches.

use async_trait::async_trait;
use qharvest_core::{CollectedQuestion, CollectionConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CollectError;
use crate::fetch::FetchClient;
use crate::rate_limit::RateLimiter;

use super::QuestionCollector;

const PLATFORM: &str = "weixin_hot";
const BASE_URL: &str = "http://apis.juhe.cn";
const REQUESTS_PER_SECOND: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct HotTopicResponse {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    result: Option<HotTopicResult>,
}

#[derive(Debug, Deserialize)]
struct HotTopicResult {
    #[serde(default)]
    list: Vec<HotTopicItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HotTopicItem {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    index: Option<i64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl HotTopicItem {
    fn source_url(&self) -> Option<String> {
        [&self.url, &self.link, &self.href]
            .into_iter()
            .find_map(|u| u.clone().filter(|s| !s.is_empty()))
    }

    fn article_content(&self) -> Option<String> {
        [&self.content, &self.desc, &self.description]
            .into_iter()
            .find_map(|c| c.clone().filter(|s| !s.is_empty()))
    }
}

pub struct WeixinHotCollector {
    http: FetchClient,
    limiter: RateLimiter,
    base_url: String,
    api_key: Option<String>,
}

impl WeixinHotCollector {
    /// Creates a collector against the production juhe API.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        api_key: Option<String>,
    ) -> Result<Self, CollectError> {
        Self::with_base_url(timeout_secs, user_agent, api_key, BASE_URL)
    }

    /// Creates a collector with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        api_key: Option<String>,
        base_url: &str,
    ) -> Result<Self, CollectError> {
        let http = FetchClient::new(
            timeout_secs,
            &[
                ("user-agent", user_agent),
                ("accept", "application/json"),
            ],
        )?;
        Ok(Self {
            http,
            limiter: RateLimiter::new(REQUESTS_PER_SECOND),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Splits the feed into topic matches and the rest, preserving feed
    /// order within each part. Matching is case-insensitive substring
    /// containment in either direction.
    fn partition_by_topic(items: Vec<HotTopicItem>, topic: &str) -> (Vec<HotTopicItem>, Vec<HotTopicItem>) {
        let topic_lower = topic.to_lowercase();
        items
            .into_iter()
            .filter(|item| item.word.as_deref().is_some_and(|w| !w.trim().is_empty()))
            .partition(|item| {
                let word = item.word.as_deref().unwrap_or_default().trim().to_lowercase();
                word.contains(&topic_lower) || topic_lower.contains(&word)
            })
    }

    fn question_from_item(item: &HotTopicItem, config: &CollectionConfig) -> CollectedQuestion {
        let word = item.word.as_deref().unwrap_or_default().trim().to_string();
        let rank = item.index.unwrap_or(0);

        let title = format!("关于{word}的讨论");
        let content = match item.article_content() {
            Some(article) => format!(
                "微信热搜话题：{word}\n\n{article}\n\n这是当前微信公众平台的热点话题，排名第{}位。",
                rank + 1
            ),
            None => format!(
                "微信热搜话题：{word}。这是当前微信公众平台的热点话题，排名第{}位，热度较高，值得关注和讨论。",
                rank + 1
            ),
        };

        let mut question = CollectedQuestion::new(title, content, PLATFORM);
        question.source_url = item.source_url();
        question.created_at = Some(chrono::Utc::now());
        question.tags = vec![config.topic.clone()];
        question
            .metadata
            .insert("hot_word".to_string(), json!(word));
        question
            .metadata
            .insert("hot_index".to_string(), json!(rank));
        question
            .metadata
            .insert("source_api".to_string(), json!("juhe"));
        if let Ok(raw) = serde_json::to_value(item) {
            question.metadata.insert("raw_item".to_string(), raw);
        }
        question
    }
}

#[async_trait]
impl QuestionCollector for WeixinHotCollector {
    fn platform_name(&self) -> &str {
        PLATFORM
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn collect(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(CollectError::Api {
                platform: PLATFORM.to_string(),
                reason: "JUHE_API_KEY is not configured".to_string(),
            });
        };

        self.limiter.wait_if_needed().await;

        let url = format!("{}/fapigx/wxhottopic/query", self.base_url);
        let params = [("key", api_key)];
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let parsed: HotTopicResponse = response.json("weixin hot topics")?;

        if parsed.error_code.unwrap_or(-1) != 0 {
            return Err(CollectError::Api {
                platform: PLATFORM.to_string(),
                reason: format!(
                    "error_code={}, reason={}",
                    parsed.error_code.unwrap_or(-1),
                    parsed.reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        let items = parsed.result.map(|r| r.list).unwrap_or_default();
        if items.is_empty() {
            tracing::warn!(platform = PLATFORM, "hot topic feed returned no items");
            return Ok(Vec::new());
        }

        let (matched, other) = Self::partition_by_topic(items, &config.topic);
        if matched.is_empty() {
            tracing::info!(
                platform = PLATFORM,
                topic = %config.topic,
                "no trending topic matches — returning unmatched hot topics"
            );
        }

        let mut questions: Vec<CollectedQuestion> = matched
            .iter()
            .chain(other.iter())
            .take(config.max_results)
            .map(|item| Self::question_from_item(item, config))
            .collect();

        // Hotter topics first: larger hot_index means a hotter topic.
        questions.sort_by_key(|q| {
            std::cmp::Reverse(
                q.metadata
                    .get("hot_index")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
            )
        });

        tracing::debug!(platform = PLATFORM, count = questions.len(), "collected hot topics");
        Ok(questions)
    }
}
