//! Generic collector for third-party API aggregator platforms.
//!
//! One collector type serves any aggregator backend: a provider
//! discriminator selects the request-parameter and API-key conventions,
//! and a declarative mapping of dotted response-field paths pulls
//! questions (and optionally embedded answers) out of whatever shape the
//! backend returns. Ready-made mappings for known platform/provider pairs
//! live in [`super::presets`].

use async_trait::async_trait;
use chrono::Utc;
use qharvest_core::{CollectedAnswer, CollectedQuestion, CollectionConfig};
use serde_json::{json, Value};

use crate::error::CollectError;
use crate::fetch::FetchClient;
use crate::rate_limit::RateLimiter;

use super::helpers::{finalize_answers, flexible_time_or_now};
use super::QuestionCollector;

const REQUESTS_PER_SECOND: f64 = 1.0;

/// Aggregator backend, selecting envelope and key-placement conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Juhe,
    Showapi,
    Custom,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Juhe => "juhe",
            Provider::Showapi => "showapi",
            Provider::Custom => "custom",
        }
    }
}

/// Dotted paths from a response item to question fields.
#[derive(Debug, Clone)]
pub struct FieldPaths {
    pub title: String,
    pub content: String,
    pub source_url: String,
    pub author: String,
    pub created_at: String,
}

impl Default for FieldPaths {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            content: "content".to_string(),
            source_url: "url".to_string(),
            author: "author".to_string(),
            created_at: "created_at".to_string(),
        }
    }
}

/// Dotted paths from an embedded answer item to answer fields.
#[derive(Debug, Clone)]
pub struct AnswerFieldPaths {
    pub content: String,
    pub author: String,
    pub upvotes: String,
    pub downvotes: String,
    pub source_url: String,
}

impl Default for AnswerFieldPaths {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            author: "author".to_string(),
            upvotes: "upvotes".to_string(),
            downvotes: "downvotes".to_string(),
            source_url: "url".to_string(),
        }
    }
}

/// Full declarative configuration of one aggregator backend.
#[derive(Debug, Clone)]
pub struct ThirdPartyConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: Option<String>,
    pub search_endpoint: String,
    /// Request parameter carrying the topic.
    pub topic_param: String,
    /// Request parameter carrying the result-count limit.
    pub max_results_param: String,
    pub custom_params: Vec<(String, String)>,
    /// Dotted path to the item list; used by the `Custom` provider (juhe
    /// and showapi have fixed envelopes).
    pub items_path: String,
    pub fields: FieldPaths,
    /// Field holding embedded answers, when the backend provides them.
    pub answers_field: Option<String>,
    pub answer_fields: AnswerFieldPaths,
}

impl ThirdPartyConfig {
    /// Builds a config with the provider's conventional base URL and
    /// parameter names; callers override fields as needed.
    #[must_use]
    pub fn new(provider: Provider, api_key: &str, search_endpoint: &str) -> Self {
        let (base_url, topic_param, max_results_param) = match provider {
            Provider::Juhe => ("http://v.juhe.cn", "q", "pagesize"),
            Provider::Showapi => ("https://route.showapi.com", "keyword", "pageSize"),
            Provider::Custom => ("", "q", "limit"),
        };
        Self {
            provider,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: None,
            search_endpoint: search_endpoint.to_string(),
            topic_param: topic_param.to_string(),
            max_results_param: max_results_param.to_string(),
            custom_params: Vec::new(),
            items_path: "data".to_string(),
            fields: FieldPaths::default(),
            answers_field: None,
            answer_fields: AnswerFieldPaths::default(),
        }
    }
}

/// Walks a dotted path through nested JSON objects.
fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Extracts a field as a string: strings pass through, numbers and bools
/// are stringified, null and empty strings read as absent.
fn field_string(item: &Value, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    match value_at(item, path)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Treats the extracted value as a list: arrays pass through, a lone object
/// is wrapped, null/missing is empty.
fn as_item_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

pub struct ThirdPartyCollector {
    platform: String,
    config: ThirdPartyConfig,
    http: FetchClient,
    limiter: RateLimiter,
}

impl ThirdPartyCollector {
    /// Creates a collector presenting itself as `platform_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn new(
        platform_name: &str,
        config: ThirdPartyConfig,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CollectError> {
        let http = FetchClient::new(
            timeout_secs,
            &[
                ("user-agent", user_agent),
                ("accept", "application/json"),
            ],
        )?;
        Ok(Self {
            platform: platform_name.to_string(),
            config,
            http,
            limiter: RateLimiter::new(REQUESTS_PER_SECOND),
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.search_endpoint.trim_start_matches('/')
        )
    }

    fn request_params(&self, config: &CollectionConfig) -> Vec<(String, String)> {
        let mut params = Vec::new();
        match self.config.provider {
            Provider::Juhe => {
                params.push(("key".to_string(), self.config.api_key.clone()));
            }
            Provider::Showapi => {
                params.push(("showapi_appid".to_string(), self.config.api_key.clone()));
                params.push((
                    "showapi_sign".to_string(),
                    self.config.api_secret.clone().unwrap_or_default(),
                ));
            }
            Provider::Custom => {
                params.push(("api_key".to_string(), self.config.api_key.clone()));
                if let Some(secret) = &self.config.api_secret {
                    params.push(("api_secret".to_string(), secret.clone()));
                }
            }
        }
        params.push((self.config.topic_param.clone(), config.topic.clone()));
        params.push((
            self.config.max_results_param.clone(),
            config.max_results.min(50).to_string(),
        ));
        for (name, value) in &self.config.custom_params {
            params.push((name.clone(), value.clone()));
        }
        params
    }

    /// Unwraps the provider envelope and maps items to questions.
    fn parse_response(
        &self,
        body: &Value,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError> {
        let items = match self.config.provider {
            Provider::Juhe => {
                if body.get("error_code").and_then(Value::as_i64) != Some(0) {
                    return Err(CollectError::Api {
                        platform: self.platform.clone(),
                        reason: format!(
                            "error_code={}, reason={}",
                            body.get("error_code").and_then(Value::as_i64).unwrap_or(-1),
                            field_string(body, "reason").unwrap_or_else(|| "unknown".to_string()),
                        ),
                    });
                }
                let result = body.get("result");
                match result {
                    Some(Value::Object(_)) => as_item_list(result.and_then(|r| r.get("data"))),
                    other => as_item_list(other),
                }
            }
            Provider::Showapi => {
                if body.get("showapi_res_code").and_then(Value::as_i64) != Some(0) {
                    return Err(CollectError::Api {
                        platform: self.platform.clone(),
                        reason: format!(
                            "showapi_res_code={}",
                            body.get("showapi_res_code")
                                .and_then(Value::as_i64)
                                .unwrap_or(-1)
                        ),
                    });
                }
                let res_body = body.get("showapi_res_body");
                let list = res_body
                    .and_then(|b| b.get("list"))
                    .or_else(|| res_body.and_then(|b| b.get("data")));
                as_item_list(list)
            }
            Provider::Custom => as_item_list(value_at(body, &self.config.items_path)),
        };

        Ok(items
            .into_iter()
            .take(config.max_results)
            .filter_map(|item| self.parse_item(item, config))
            .collect())
    }

    /// Maps one response item into a question. Items without a title are
    /// skipped.
    fn parse_item(&self, item: &Value, config: &CollectionConfig) -> Option<CollectedQuestion> {
        let title = field_string(item, &self.config.fields.title)?;
        let content = field_string(item, &self.config.fields.content).unwrap_or_default();

        let mut question = CollectedQuestion::new(title, content, &self.platform);
        question.source_url = field_string(item, &self.config.fields.source_url);
        question.author = field_string(item, &self.config.fields.author);
        question.created_at = Some(flexible_time_or_now(value_at(
            item,
            &self.config.fields.created_at,
        )));
        question.tags = vec![config.topic.clone()];
        question
            .metadata
            .insert("third_party_api".to_string(), json!(true));
        question.metadata.insert(
            "provider".to_string(),
            json!(self.config.provider.as_str()),
        );
        question
            .metadata
            .insert("raw_item".to_string(), item.clone());

        if config.collect_answers {
            question.answers = self.answers_from_item(item, config);
        }
        Some(question)
    }

    fn answers_from_item(&self, item: &Value, config: &CollectionConfig) -> Vec<CollectedAnswer> {
        let Some(answers_field) = &self.config.answers_field else {
            return Vec::new();
        };
        let paths = &self.config.answer_fields;

        let candidates = as_item_list(value_at(item, answers_field));
        let mut answers = Vec::new();
        // Over-scan relative to the cap so the upvote filter has room to work.
        for candidate in candidates
            .into_iter()
            .take(config.max_answers_per_question.saturating_mul(2))
        {
            let upvotes = field_string(candidate, &paths.upvotes)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            if upvotes < config.min_answer_upvotes {
                continue;
            }
            let Some(content) = field_string(candidate, &paths.content) else {
                continue;
            };

            let mut answer = CollectedAnswer::new(content);
            answer.author = field_string(candidate, &paths.author);
            answer.upvotes = upvotes;
            answer.downvotes = field_string(candidate, &paths.downvotes)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            answer.source_url = field_string(candidate, &paths.source_url);
            answer.created_at = Some(Utc::now());
            answer
                .metadata
                .insert("third_party_api".to_string(), json!(true));
            answers.push(answer);
        }

        finalize_answers(answers, config)
    }
}

#[async_trait]
impl QuestionCollector for ThirdPartyCollector {
    fn platform_name(&self) -> &str {
        &self.platform
    }

    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn collect(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError> {
        self.limiter.wait_if_needed().await;

        let url = self.search_url();
        let owned_params = self.request_params(config);
        let params: Vec<(&str, String)> = owned_params
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let body: Value = response.json("third-party search")?;
        let questions = self.parse_response(&body, config)?;
        tracing::debug!(
            platform = %self.platform,
            provider = self.config.provider.as_str(),
            count = questions.len(),
            "collected questions"
        );
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(config: ThirdPartyConfig) -> ThirdPartyCollector {
        ThirdPartyCollector::new("zhihu", config, 5, "qharvest-test")
            .expect("collector construction should not fail")
    }

    fn run_config() -> CollectionConfig {
        let mut config = CollectionConfig::new("股票").unwrap();
        config.min_answer_upvotes = 10;
        config.max_answers_per_question = 2;
        config
    }

    #[test]
    fn dotted_paths_walk_nested_objects() {
        let item = serde_json::json!({"author": {"name": "张三", "id": 7}});
        assert_eq!(field_string(&item, "author.name").as_deref(), Some("张三"));
        assert_eq!(field_string(&item, "author.id").as_deref(), Some("7"));
        assert_eq!(field_string(&item, "author.missing"), None);
        assert_eq!(field_string(&item, ""), None);
    }

    #[test]
    fn juhe_envelope_unwraps_result_data() {
        let mut config = ThirdPartyConfig::new(Provider::Juhe, "key", "zhihu/search");
        config.fields.content = "excerpt".to_string();
        let collector = collector(config);

        let body = serde_json::json!({
            "error_code": 0,
            "result": {"data": [
                {"title": "股票怎么入门？", "excerpt": "新手求指导", "url": "https://example.com/q/1"}
            ]}
        });
        let questions = collector.parse_response(&body, &run_config()).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "股票怎么入门？");
        assert_eq!(questions[0].content, "新手求指导");
        assert_eq!(questions[0].metadata.get("provider").unwrap(), "juhe");
    }

    #[test]
    fn juhe_error_code_is_an_api_error() {
        let collector = collector(ThirdPartyConfig::new(Provider::Juhe, "key", "zhihu/search"));
        let body = serde_json::json!({"error_code": 10012, "reason": "超过每日可允许请求次数"});
        let result = collector.parse_response(&body, &run_config());
        assert!(matches!(result, Err(CollectError::Api { .. })));
    }

    #[test]
    fn showapi_envelope_unwraps_list() {
        let collector =
            collector(ThirdPartyConfig::new(Provider::Showapi, "appid", "109-35"));
        let body = serde_json::json!({
            "showapi_res_code": 0,
            "showapi_res_body": {"list": [{"title": "基金怎么选？"}]}
        });
        let questions = collector.parse_response(&body, &run_config()).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "基金怎么选？");
    }

    #[test]
    fn custom_items_path_walks_to_the_list() {
        let mut config = ThirdPartyConfig::new(Provider::Custom, "key", "search");
        config.items_path = "payload.questions".to_string();
        let collector = collector(config);

        let body = serde_json::json!({
            "payload": {"questions": [{"title": "如何开户？"}, {"no_title": true}]}
        });
        let questions = collector.parse_response(&body, &run_config()).unwrap();
        // The title-less item is skipped, not an error.
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn embedded_answers_are_filtered_sorted_and_capped() {
        let mut config = ThirdPartyConfig::new(Provider::Custom, "key", "search");
        config.items_path = "data".to_string();
        config.answers_field = Some("answers".to_string());
        config.answer_fields.upvotes = "voteup_count".to_string();
        let collector = collector(config);

        let body = serde_json::json!({"data": [{
            "title": "股票怎么入门？",
            "answers": [
                {"content": "低票", "voteup_count": 3},
                {"content": "中票", "voteup_count": 20},
                {"content": "高票", "voteup_count": 90},
                {"content": "次高", "voteup_count": 50}
            ]
        }]});
        let questions = collector.parse_response(&body, &run_config()).unwrap();
        let answers = &questions[0].answers;
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].content, "高票");
        assert_eq!(answers[1].content, "次高");
        assert!(answers.iter().all(|a| a.upvotes >= 10));
    }

    #[test]
    fn key_placement_follows_the_provider() {
        let run = run_config();

        let juhe = collector(ThirdPartyConfig::new(Provider::Juhe, "jk", "zhihu/search"));
        assert!(juhe.request_params(&run).contains(&("key".to_string(), "jk".to_string())));

        let mut showapi_config = ThirdPartyConfig::new(Provider::Showapi, "app", "109-35");
        showapi_config.api_secret = Some("sec".to_string());
        let showapi = collector(showapi_config);
        let params = showapi.request_params(&run);
        assert!(params.contains(&("showapi_appid".to_string(), "app".to_string())));
        assert!(params.contains(&("showapi_sign".to_string(), "sec".to_string())));
        assert!(params.contains(&("keyword".to_string(), "股票".to_string())));
    }
}
