use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::{TextCompletion, VisionCompletion};
use crate::platform::Platform;
use crate::posting::images::ImageFetcher;
use crate::posting::publisher::Publisher;
use crate::posting::scraper::PageScraper;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn TextCompletion>,
    pub vision: Arc<dyn VisionCompletion>,
    pub platform: Arc<dyn Platform>,
    pub scraper: Arc<dyn PageScraper>,
    pub images: Arc<dyn ImageFetcher>,
    /// Configured publishing destinations, at most one per target.
    pub publishers: Vec<Arc<dyn Publisher>>,
    pub config: Config,
}
