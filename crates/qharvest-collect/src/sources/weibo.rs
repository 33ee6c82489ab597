//! Weibo collector: mobile search API for posts, comments harvested as
//! answers.
//!
//! Comments come from the official open-platform endpoint when an access
//! token is configured, falling back to the public mobile `hotflow` endpoint
//! otherwise (or when the official call fails).

use async_trait::async_trait;
use qharvest_core::{CollectedAnswer, CollectedQuestion, CollectionConfig};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CollectError;
use crate::fetch::FetchClient;
use crate::rate_limit::RateLimiter;
use crate::text::clean_html_fragment;

use super::helpers::{count_u32, finalize_answers, json_id_string, social_time_or_now};
use super::QuestionCollector;

const PLATFORM: &str = "weibo";
const MOBILE_BASE_URL: &str = "https://m.weibo.cn";
const API_BASE_URL: &str = "https://api.weibo.com/2";
const REQUESTS_PER_SECOND: f64 = 0.2;

/// Mobile search cards: type 9 is a post card.
const POST_CARD_TYPE: i64 = 9;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
struct Card {
    #[serde(default)]
    card_type: Option<i64>,
    #[serde(default)]
    mblog: Option<Mblog>,
}

#[derive(Debug, Deserialize)]
struct Mblog {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    bid: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    reposts_count: Option<i64>,
    #[serde(default)]
    comments_count: Option<i64>,
    #[serde(default)]
    attitudes_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    screen_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfficialCommentsResponse {
    /// The open platform reports failures inside a 200 body.
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    comments: Vec<OfficialComment>,
}

#[derive(Debug, Deserialize)]
struct OfficialComment {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    attitudes_count: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct MobileCommentsResponse {
    #[serde(default)]
    data: Vec<MobileComment>,
}

#[derive(Debug, Deserialize)]
struct MobileComment {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    like_count: Option<i64>,
    #[serde(default)]
    total_number: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

pub struct WeiboCollector {
    http: FetchClient,
    limiter: RateLimiter,
    mobile_base: String,
    api_base: String,
    access_token: Option<String>,
}

impl WeiboCollector {
    /// Creates a collector against the production weibo endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        access_token: Option<String>,
    ) -> Result<Self, CollectError> {
        Self::with_base_urls(
            timeout_secs,
            user_agent,
            access_token,
            MOBILE_BASE_URL,
            API_BASE_URL,
        )
    }

    /// Creates a collector with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn with_base_urls(
        timeout_secs: u64,
        user_agent: &str,
        access_token: Option<String>,
        mobile_base: &str,
        api_base: &str,
    ) -> Result<Self, CollectError> {
        let http = FetchClient::new(
            timeout_secs,
            &[
                ("user-agent", user_agent),
                ("accept", "application/json, text/plain, */*"),
                ("accept-language", "zh-CN,zh;q=0.9"),
                ("referer", "https://weibo.com/"),
            ],
        )?;
        Ok(Self {
            http,
            limiter: RateLimiter::new(REQUESTS_PER_SECOND),
            mobile_base: mobile_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Fetches comments for one post, preferring the official endpoint when
    /// a token is present. All failures degrade to an empty list.
    async fn collect_comments(
        &self,
        post_id: &str,
        config: &CollectionConfig,
    ) -> Vec<CollectedAnswer> {
        if let Some(token) = self.access_token.clone() {
            match self.fetch_official_comments(&token, post_id, config).await {
                Ok(answers) => return answers,
                Err(e) => {
                    tracing::warn!(
                        platform = PLATFORM,
                        post_id = %post_id,
                        error = %e,
                        "official comments failed — falling back to mobile endpoint"
                    );
                }
            }
        }

        match self.fetch_mobile_comments(post_id, config).await {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!(
                    platform = PLATFORM,
                    post_id = %post_id,
                    error = %e,
                    "comment harvest failed"
                );
                Vec::new()
            }
        }
    }

    async fn fetch_official_comments(
        &self,
        access_token: &str,
        post_id: &str,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedAnswer>, CollectError> {
        self.limiter.wait_if_needed().await;

        let count = config.max_answers_per_question.saturating_mul(3).min(50);
        let params = [
            ("access_token", access_token.to_string()),
            ("id", post_id.to_string()),
            ("count", count.to_string()),
            ("page", "1".to_string()),
        ];
        let url = format!("{}/comments/show.json", self.api_base);
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let parsed: OfficialCommentsResponse = response.json("weibo official comments")?;
        if let Some(error) = parsed.error {
            return Err(CollectError::Api {
                platform: PLATFORM.to_string(),
                reason: error.to_string(),
            });
        }

        let mut answers = Vec::new();
        for comment in parsed.comments {
            let upvotes = count_u32(comment.attitudes_count);
            if upvotes < config.min_answer_upvotes {
                continue;
            }
            let text = comment
                .text
                .as_deref()
                .map(clean_html_fragment)
                .unwrap_or_default();
            if text.is_empty() {
                continue;
            }

            let mut answer = CollectedAnswer::new(text);
            answer.author = comment
                .user
                .and_then(|u| u.screen_name)
                .filter(|n| !n.is_empty());
            answer.upvotes = upvotes;
            // Weibo comments have no downvotes.
            answer.downvotes = 0;
            answer.created_at = Some(social_time_or_now(comment.created_at.as_deref()));
            if let Some(comment_id) = comment.id.as_ref().and_then(json_id_string) {
                answer.source_url = Some(format!("https://weibo.com/comment/{comment_id}"));
                answer
                    .metadata
                    .insert("weibo_comment_id".to_string(), json!(comment_id));
            }
            answer
                .metadata
                .insert("official_api".to_string(), json!(true));
            answers.push(answer);
        }

        Ok(finalize_answers(answers, config))
    }

    async fn fetch_mobile_comments(
        &self,
        post_id: &str,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedAnswer>, CollectError> {
        self.limiter.wait_if_needed().await;

        let params = [
            ("id", post_id.to_string()),
            ("mid", post_id.to_string()),
            ("max_id_type", "0".to_string()),
        ];
        let url = format!("{}/comments/hotflow", self.mobile_base);
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let parsed: MobileCommentsResponse = response.json("weibo mobile comments")?;

        let mut answers = Vec::new();
        for comment in parsed.data {
            let upvotes = count_u32(comment.like_count);
            if upvotes < config.min_answer_upvotes {
                continue;
            }
            let text = comment
                .text
                .as_deref()
                .map(clean_html_fragment)
                .unwrap_or_default();
            if text.is_empty() {
                continue;
            }

            let mut answer = CollectedAnswer::new(text);
            answer.author = comment
                .user
                .and_then(|u| u.screen_name)
                .filter(|n| !n.is_empty());
            answer.upvotes = upvotes;
            answer.downvotes = 0;
            answer.created_at = Some(social_time_or_now(comment.created_at.as_deref()));
            if let Some(comment_id) = comment.id.as_ref().and_then(json_id_string) {
                answer.source_url = Some(format!("https://m.weibo.cn/comment/{comment_id}"));
                answer
                    .metadata
                    .insert("weibo_comment_id".to_string(), json!(comment_id));
            }
            answer.metadata.insert(
                "reply_count".to_string(),
                json!(comment.total_number.unwrap_or(0)),
            );
            answers.push(answer);
        }

        Ok(finalize_answers(answers, config))
    }
}

#[async_trait]
impl QuestionCollector for WeiboCollector {
    fn platform_name(&self) -> &str {
        PLATFORM
    }

    fn is_available(&self) -> bool {
        // The mobile search endpoint is public; the token only upgrades the
        // comment source.
        true
    }

    async fn collect(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError> {
        self.limiter.wait_if_needed().await;

        let params = [
            (
                "containerid",
                format!("100103type=1&q={}", config.topic),
            ),
            ("page_type", "searchall".to_string()),
            ("page", "1".to_string()),
        ];
        let url = format!("{}/api/container/getIndex", self.mobile_base);
        let response = self.http.get(&url, &params, &[]).await?;
        if !response.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: response.status,
                url,
            });
        }
        let search: SearchResponse = response.json("weibo search")?;
        let cards = search.data.map(|d| d.cards).unwrap_or_default();
        tracing::debug!(platform = PLATFORM, cards = cards.len(), "search returned cards");

        let mut questions = Vec::new();
        for card in cards {
            if card.card_type != Some(POST_CARD_TYPE) {
                continue;
            }
            let Some(mblog) = card.mblog else { continue };
            let text = mblog.text.clone().unwrap_or_default();
            if !text.contains(&config.topic) {
                continue;
            }

            let cleaned = clean_html_fragment(&text);
            // Posts rarely carry a real title; fall back to the first 100
            // characters of the cleaned text.
            let title = match &mblog.title {
                Some(t) if !t.is_empty() => t.clone(),
                _ => cleaned.chars().take(100).collect(),
            };

            let post_id = mblog.id.as_ref().and_then(json_id_string);
            let answers = match (&post_id, config.collect_answers) {
                (Some(id), true) => self.collect_comments(id, config).await,
                _ => Vec::new(),
            };

            let mut question = CollectedQuestion::new(title, cleaned, PLATFORM);
            let user_id = mblog
                .user
                .as_ref()
                .and_then(|u| u.id.as_ref())
                .and_then(json_id_string)
                .unwrap_or_default();
            let bid = mblog.bid.clone().unwrap_or_default();
            question.source_url = Some(format!("https://weibo.com/{user_id}/{bid}"));
            question.author = mblog
                .user
                .and_then(|u| u.screen_name)
                .filter(|n| !n.is_empty());
            question.created_at = Some(social_time_or_now(mblog.created_at.as_deref()));
            question.tags = vec![config.topic.clone()];
            if let Some(id) = post_id {
                question.metadata.insert("weibo_id".to_string(), json!(id));
            }
            question.metadata.insert(
                "reposts_count".to_string(),
                json!(mblog.reposts_count.unwrap_or(0)),
            );
            question.metadata.insert(
                "comments_count".to_string(),
                json!(mblog.comments_count.unwrap_or(0)),
            );
            question.metadata.insert(
                "attitudes_count".to_string(),
                json!(mblog.attitudes_count.unwrap_or(0)),
            );
            question.answers = answers;
            questions.push(question);

            if questions.len() >= config.max_results {
                break;
            }
        }

        tracing::debug!(platform = PLATFORM, count = questions.len(), "collected questions");
        Ok(questions)
    }
}
