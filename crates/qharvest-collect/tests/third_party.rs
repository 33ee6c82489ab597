//! Integration tests for the third-party aggregator collector.

use qharvest_collect::sources::presets;
use qharvest_collect::sources::{Provider, ThirdPartyCollector, ThirdPartyConfig};
use qharvest_collect::QuestionCollector;
use qharvest_core::CollectionConfig;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_config() -> CollectionConfig {
    let mut config = CollectionConfig::new("股票").expect("topic is non-empty");
    config.max_results = 5;
    config.max_answers_per_question = 2;
    config.min_answer_upvotes = 10;
    config
}

#[tokio::test]
async fn juhe_preset_end_to_end() {
    let server = MockServer::start().await;

    let mut config = presets::zhihu_juhe("jk-9");
    config.base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/zhihu/search"))
        .and(query_param("key", "jk-9"))
        .and(query_param("q", "股票"))
        .and(query_param("pagesize", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 0,
            "result": {"data": [{
                "title": "股票怎么入门？",
                "excerpt": "新手求指导",
                "url": "https://example.com/q/1",
                "author": {"name": "作者甲"},
                "created_time": 1_700_000_000,
                "answers": [
                    {"content": "回答一", "voteup_count": 40, "author": {"name": "答主"}},
                    {"content": "回答二", "voteup_count": 2}
                ]
            }]}
        })))
        .mount(&server)
        .await;

    let collector = ThirdPartyCollector::new("zhihu", config, 30, "qharvest-test")
        .expect("collector construction should not fail");
    let questions = collector
        .collect(&run_config())
        .await
        .expect("collect should succeed");

    assert_eq!(questions.len(), 1);
    let q = &questions[0];
    assert_eq!(q.title, "股票怎么入门？");
    assert_eq!(q.content, "新手求指导");
    assert_eq!(q.author.as_deref(), Some("作者甲"));
    assert_eq!(q.created_at.unwrap().timestamp(), 1_700_000_000);
    assert_eq!(q.source, "zhihu");
    assert_eq!(q.metadata.get("provider").unwrap(), "juhe");

    assert_eq!(q.answers.len(), 1, "low-upvote embedded answer is dropped");
    assert_eq!(q.answers[0].content, "回答一");
    assert_eq!(q.answers[0].author.as_deref(), Some("答主"));
}

#[tokio::test]
async fn showapi_key_placement_and_envelope() {
    let server = MockServer::start().await;

    let mut config = presets::zhihu_showapi("app-1", "sec-1", "109-35");
    config.base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/109-35"))
        .and(query_param("showapi_appid", "app-1"))
        .and(query_param("showapi_sign", "sec-1"))
        .and(query_param("keyword", "股票"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "showapi_res_code": 0,
            "showapi_res_body": {"list": [{"title": "基金怎么选？", "content": "正文"}]}
        })))
        .mount(&server)
        .await;

    let collector = ThirdPartyCollector::new("zhihu", config, 30, "qharvest-test")
        .expect("collector construction should not fail");
    let questions = collector
        .collect(&run_config())
        .await
        .expect("collect should succeed");

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].title, "基金怎么选？");
}

#[tokio::test]
async fn custom_provider_walks_the_items_path() {
    let server = MockServer::start().await;

    let mut config = ThirdPartyConfig::new(Provider::Custom, "ck", "search");
    config.base_url = server.uri();
    config.items_path = "payload.questions".to_string();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("api_key", "ck"))
        .and(query_param("q", "股票"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"questions": [{"title": "如何开户？"}]}
        })))
        .mount(&server)
        .await;

    let collector = ThirdPartyCollector::new("broker-faq", config, 30, "qharvest-test")
        .expect("collector construction should not fail");
    let questions = collector
        .collect(&run_config())
        .await
        .expect("collect should succeed");

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].source, "broker-faq");
}

#[tokio::test]
async fn transport_failure_surfaces_as_an_error() {
    let server = MockServer::start().await;

    let mut config = presets::zhihu_juhe("jk-9");
    config.base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/zhihu/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collector = ThirdPartyCollector::new("zhihu", config, 30, "qharvest-test")
        .expect("collector construction should not fail");
    assert!(collector.collect(&run_config()).await.is_err());
}
