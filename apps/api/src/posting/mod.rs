pub mod drafter;
pub mod handlers;
pub mod images;
pub mod prompts;
pub mod publisher;
pub mod revise;
pub mod scraper;
pub mod twitter;

pub use images::HttpImageFetcher;
pub use publisher::CommunityPublisher;
pub use scraper::FirecrawlClient;
pub use twitter::TwitterClient;
