//! Integration tests for the weixin hot-topic collector using wiremock.

use qharvest_collect::sources::WeixinHotCollector;
use qharvest_collect::QuestionCollector;
use qharvest_core::CollectionConfig;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collector(server: &MockServer, api_key: Option<&str>) -> WeixinHotCollector {
    WeixinHotCollector::with_base_url(
        30,
        "qharvest-test",
        api_key.map(str::to_string),
        &server.uri(),
    )
    .expect("collector construction should not fail")
}

fn run_config(max_results: usize) -> CollectionConfig {
    let mut config = CollectionConfig::new("股票").expect("topic is non-empty");
    config.max_results = max_results;
    config
}

#[tokio::test]
async fn topic_matches_lead_and_hotter_topics_come_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fapigx/wxhottopic/query"))
        .and(query_param("key", "jk-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 0,
            "reason": "success",
            "result": {"list": [
                {"word": "天气预报", "index": 9},
                {"word": "股票大涨", "index": 3},
                {"word": "股票暴跌", "index": 7, "url": "https://example.com/hot/7"}
            ]}
        })))
        .mount(&server)
        .await;

    let questions = collector(&server, Some("jk-1"))
        .collect(&run_config(2))
        .await
        .expect("collect should succeed");

    // Both topic matches fill the cap before any unmatched item; within the
    // result, the larger hot index leads.
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].title, "关于股票暴跌的讨论");
    assert_eq!(questions[0].metadata.get("hot_index").unwrap(), 7);
    assert_eq!(
        questions[0].source_url.as_deref(),
        Some("https://example.com/hot/7")
    );
    assert_eq!(questions[1].title, "关于股票大涨的讨论");
    assert!(questions[1].content.contains("排名第4位"));
    assert_eq!(questions[0].source, "weixin_hot");
}

#[tokio::test]
async fn unmatched_hot_topics_pad_the_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fapigx/wxhottopic/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 0,
            "result": {"list": [
                {"word": "天气预报", "index": 2},
                {"word": "体育赛事", "index": 5}
            ]}
        })))
        .mount(&server)
        .await;

    let questions = collector(&server, Some("jk-1"))
        .collect(&run_config(10))
        .await
        .expect("collect should succeed");

    // Nothing trending matches the topic, but the run still returns the
    // feed rather than nothing.
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].metadata.get("hot_word").unwrap(), "体育赛事");
}

#[tokio::test]
async fn api_error_code_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fapigx/wxhottopic/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 10012,
            "reason": "超过每日可允许请求次数"
        })))
        .mount(&server)
        .await;

    let result = collector(&server, Some("jk-1")).collect(&run_config(5)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_key_means_unavailable() {
    let server = MockServer::start().await;
    let collector = collector(&server, None);
    assert!(!collector.is_available());
    // Explicitly calling collect anyway is an error, not mock data.
    assert!(collector.collect(&run_config(5)).await.is_err());
}
