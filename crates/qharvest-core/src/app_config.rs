/// Application configuration, loaded once at startup and passed explicitly
/// into the service constructor. There is no process-global wiring: whether
/// the zhihu/weibo collectors go through a third-party aggregator is a field
/// here, not an import-time side effect.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    /// Route zhihu/weibo collection through a third-party aggregator when
    /// their aggregator keys are configured.
    pub use_third_party: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Juhe key for the weixin hot-topic feed.
    pub juhe_api_key: Option<String>,
    /// Weibo OAuth token; switches comment harvesting to the official API.
    pub weibo_access_token: Option<String>,
    pub zhihu_juhe_api_key: Option<String>,
    pub weibo_juhe_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("use_third_party", &self.use_third_party)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("juhe_api_key", &self.juhe_api_key.as_ref().map(|_| "[redacted]"))
            .field(
                "weibo_access_token",
                &self.weibo_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "zhihu_juhe_api_key",
                &self.zhihu_juhe_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "weibo_juhe_api_key",
                &self.weibo_juhe_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
