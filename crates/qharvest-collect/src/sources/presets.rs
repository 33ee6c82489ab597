//! Ready-made aggregator mappings for known platform/provider pairs.

use super::third_party::{Provider, ThirdPartyConfig};

/// Zhihu search routed through the juhe aggregator.
#[must_use]
pub fn zhihu_juhe(api_key: &str) -> ThirdPartyConfig {
    let mut config = ThirdPartyConfig::new(Provider::Juhe, api_key, "zhihu/search");
    config.items_path = "result.data".to_string();
    config.fields.title = "title".to_string();
    config.fields.content = "excerpt".to_string();
    config.fields.source_url = "url".to_string();
    config.fields.author = "author.name".to_string();
    config.fields.created_at = "created_time".to_string();
    config.answers_field = Some("answers".to_string());
    config.answer_fields.content = "content".to_string();
    config.answer_fields.author = "author.name".to_string();
    config.answer_fields.upvotes = "voteup_count".to_string();
    config.answer_fields.downvotes = "votedown_count".to_string();
    config.answer_fields.source_url = "url".to_string();
    config
}

/// Weibo search routed through the juhe aggregator. Posts have no separate
/// title, so both title and content map to the post text; comments surface
/// as answers.
#[must_use]
pub fn weibo_juhe(api_key: &str) -> ThirdPartyConfig {
    let mut config = ThirdPartyConfig::new(Provider::Juhe, api_key, "weibo/search");
    config.items_path = "result.data".to_string();
    config.fields.title = "text".to_string();
    config.fields.content = "text".to_string();
    config.fields.source_url = "url".to_string();
    config.fields.author = "user.screen_name".to_string();
    config.fields.created_at = "created_at".to_string();
    config.answers_field = Some("comments".to_string());
    config.answer_fields.content = "text".to_string();
    config.answer_fields.author = "user.screen_name".to_string();
    config.answer_fields.upvotes = "like_count".to_string();
    config.answer_fields.source_url = "url".to_string();
    config
}

/// Zhihu search routed through showapi. The endpoint is the showapi
/// interface number assigned to the subscribed API.
#[must_use]
pub fn zhihu_showapi(app_id: &str, secret: &str, endpoint: &str) -> ThirdPartyConfig {
    let mut config = ThirdPartyConfig::new(Provider::Showapi, app_id, endpoint);
    config.api_secret = Some(secret.to_string());
    config.items_path = "showapi_res_body.list".to_string();
    config.fields.title = "title".to_string();
    config.fields.content = "content".to_string();
    config.fields.source_url = "url".to_string();
    config.fields.author = "author".to_string();
    config.fields.created_at = "created".to_string();
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zhihu_juhe_maps_nested_author() {
        let config = zhihu_juhe("key");
        assert_eq!(config.provider, Provider::Juhe);
        assert_eq!(config.fields.author, "author.name");
        assert_eq!(config.fields.content, "excerpt");
        assert_eq!(config.answers_field.as_deref(), Some("answers"));
    }

    #[test]
    fn weibo_juhe_uses_post_text_for_both_title_and_content() {
        let config = weibo_juhe("key");
        assert_eq!(config.fields.title, "text");
        assert_eq!(config.fields.content, "text");
        assert_eq!(config.answer_fields.upvotes, "like_count");
    }

    #[test]
    fn showapi_preset_carries_the_signing_secret() {
        let config = zhihu_showapi("app", "secret", "109-35");
        assert_eq!(config.provider, Provider::Showapi);
        assert_eq!(config.api_secret.as_deref(), Some("secret"));
        assert_eq!(config.topic_param, "keyword");
    }
}
