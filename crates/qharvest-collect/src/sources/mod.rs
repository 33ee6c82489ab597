//! Source collector abstractions and the per-platform implementations.

mod helpers;
pub mod presets;
mod third_party;
mod weibo;
mod weixin_hot;
mod zhihu;

pub use third_party::{Provider, ThirdPartyCollector, ThirdPartyConfig};
pub use weibo::WeiboCollector;
pub use weixin_hot::WeixinHotCollector;
pub use zhihu::ZhihuCollector;

use async_trait::async_trait;
use qharvest_core::{CollectedQuestion, CollectionConfig};

use crate::error::CollectError;

/// A platform-specific question collector.
///
/// Implementations perform their network I/O through a [`crate::FetchClient`]
/// they own, pacing every outbound call with their own [`crate::RateLimiter`].
/// A failing call returns an error or a partial list — never fabricated
/// placeholder data.
#[async_trait]
pub trait QuestionCollector: Send + Sync {
    /// Stable platform slug, unique across registered collectors.
    fn platform_name(&self) -> &str;

    /// True iff required credentials/configuration are present. Reads
    /// configuration only — no I/O.
    fn is_available(&self) -> bool;

    /// Gathers candidate questions for the configured topic.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] when the platform cannot be queried at all;
    /// the manager logs and skips a failing collector. Per-item problems are
    /// absorbed inside the collector (the item is dropped or falls back to
    /// partial data).
    async fn collect(
        &self,
        config: &CollectionConfig,
    ) -> Result<Vec<CollectedQuestion>, CollectError>;
}
