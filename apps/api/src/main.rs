mod config;
mod errors;
mod llm_client;
mod platform;
mod posting;
mod research;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::platform::RedditClient;
use crate::posting::publisher::Publisher;
use crate::posting::{CommunityPublisher, FirecrawlClient, HttpImageFetcher, TwitterClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Research API v{}", env!("CARGO_PKG_VERSION"));

    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let reddit = Arc::new(RedditClient::new(config.reddit.clone()));
    info!("Reddit client initialized as '{}'", config.reddit.username);

    let scraper = FirecrawlClient::new(config.firecrawl_api_key.clone());

    let mut publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(CommunityPublisher::new(
        reddit.clone(),
        config.publish.reddit_community.clone(),
    ))];
    if let Some(token) = &config.publish.twitter_access_token {
        publishers.push(Arc::new(TwitterClient::new(token.clone())));
    }
    info!(
        "Publishing to r/{} ({} destinations)",
        config.publish.reddit_community,
        publishers.len()
    );

    info!(
        "Research defaults: {} communities, {} results each, caps {}/{}/{}",
        config.research.community_limit,
        config.research.per_community_limit,
        config.research.caps.submissions,
        config.research.caps.posts,
        config.research.caps.comments
    );

    let state = AppState {
        llm: llm.clone(),
        vision: llm,
        platform: reddit,
        scraper: Arc::new(scraper),
        images: Arc::new(HttpImageFetcher::new()),
        publishers,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
